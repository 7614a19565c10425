use crate::catalog::Catalog;
use crate::fields::{self, FieldKind};
use crate::ipc::error::ok;
use crate::ipc::helpers::entity_param;
use crate::ipc::types::{AppState, Request};
use crate::schema::EntityKind;
use serde_json::json;

fn describe(kind: EntityKind, catalog: &Catalog) -> serde_json::Value {
    let columns: Vec<serde_json::Value> = kind
        .columns()
        .iter()
        .map(|c| json!({ "label": c.label, "key": c.key_str() }))
        .collect();
    let fields: Vec<serde_json::Value> = fields::descriptors(kind)
        .iter()
        .map(|d| {
            let mut f = json!({
                "field": d.attr.as_str(),
                "label": d.label,
                "kind": d.kind.tag(),
                "optional": d.kind.is_optional(),
            });
            match d.kind {
                FieldKind::Enumerated(list) => {
                    f["options"] = json!(catalog.options(list));
                }
                FieldKind::DisciplineFilter => {
                    f["options"] = json!(catalog.disciplines);
                }
                _ => {}
            }
            if let Some((target, _)) = d.kind.reference() {
                f["target"] = json!(target.as_str());
            }
            f
        })
        .collect();
    json!({
        "entity": kind.as_str(),
        "title": kind.title(),
        "columns": columns,
        "fields": fields,
    })
}

/// Works without a workspace; option lists then come from the default catalog.
fn handle_schema_describe(state: &mut AppState, req: &Request) -> serde_json::Value {
    let default_catalog = Catalog::default();
    let catalog = state
        .session()
        .map(|s| s.catalog())
        .unwrap_or(&default_catalog);

    if req.params.get("entity").is_some() {
        let kind = match entity_param(&req.params) {
            Ok(k) => k,
            Err(e) => return e.response(&req.id),
        };
        return ok(&req.id, describe(kind, catalog));
    }
    let entities: Vec<serde_json::Value> = EntityKind::ALL
        .iter()
        .map(|k| describe(*k, catalog))
        .collect();
    ok(&req.id, json!({ "entities": entities }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "schema.describe" => Some(handle_schema_describe(state, req)),
        _ => None,
    }
}
