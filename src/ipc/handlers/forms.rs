use crate::fields::{self, FieldKind};
use crate::ipc::error::ok;
use crate::ipc::helpers::{
    attr_param, entity_param, id_param, raw_text, session, session_mut, values_param, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::schema::{EntityKind, Payload};
use crate::session::{MutationOutcome, Session};
use serde_json::{json, Map, Value};

/// Raw values, selection, cascade state and the live options of every
/// choice field of one form.
fn form_view(session: &Session, kind: EntityKind) -> Value {
    let form = session.form(kind);
    let values: Map<String, Value> = form
        .values()
        .iter()
        .map(|(attr, raw)| (attr.as_str().to_string(), json!(raw)))
        .collect();
    let mut choices = Map::new();
    for d in fields::descriptors(kind) {
        match d.kind {
            FieldKind::ForeignKey { .. } | FieldKind::FilteredForeignKey { .. } => {
                let options = session
                    .field_choices(kind, d.attr)
                    .map(|set| json!(set.options()))
                    .unwrap_or_else(|| json!([]));
                choices.insert(d.attr.as_str().to_string(), options);
            }
            FieldKind::Enumerated(list) => {
                choices.insert(
                    d.attr.as_str().to_string(),
                    json!(session.catalog().options(list)),
                );
            }
            FieldKind::DisciplineFilter => {
                choices.insert(
                    d.attr.as_str().to_string(),
                    json!(session.catalog().disciplines),
                );
            }
            _ => {}
        }
    }
    json!({
        "entity": kind.as_str(),
        "values": values,
        "selectedId": form.selected(),
        "filter": form.cascade().map(|c| c.state()),
        "choices": choices,
    })
}

fn payload_json(payload: &Payload) -> Value {
    let obj: Map<String, Value> = payload
        .iter()
        .map(|(attr, v)| (attr.as_str().to_string(), v.to_json()))
        .collect();
    Value::Object(obj)
}

fn outcome_json(session: &Session, kind: EntityKind, out: MutationOutcome) -> Value {
    let refreshed: Vec<&str> = out.refreshed.iter().map(|k| k.as_str()).collect();
    json!({
        "id": out.id,
        "rows": out.rows,
        "refreshed": refreshed,
        "form": form_view(session, kind),
    })
}

fn apply_values(session: &mut Session, kind: EntityKind, req: &Request) -> Result<(), HandlerErr> {
    if let Some(inputs) = values_param(&req.params, kind)? {
        session.apply_inputs(kind, &inputs)?;
    }
    Ok(())
}

fn form_open(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let session = session_mut(state)?;
    let kind = entity_param(&req.params)?;
    session.open_form(kind)?;
    Ok(form_view(session, kind))
}

fn form_set_field(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let session = session_mut(state)?;
    let kind = entity_param(&req.params)?;
    let attr = attr_param(&req.params, kind)?;
    let raw = match req.params.get("value") {
        Some(v) => raw_text(v, "value")?,
        None => return Err(HandlerErr::bad_params("missing value")),
    };
    session.set_field(kind, attr, &raw)?;
    Ok(form_view(session, kind))
}

fn form_select_row(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let session = session_mut(state)?;
    let kind = entity_param(&req.params)?;
    let id = id_param(&req.params, "id")?;
    session.select_row(kind, id)?;
    Ok(form_view(session, kind))
}

fn form_validate(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let session = session_mut(state)?;
    let kind = entity_param(&req.params)?;
    apply_values(session, kind, req)?;
    let payload = session.validate(kind)?;
    Ok(json!({ "entity": kind.as_str(), "payload": payload_json(&payload) }))
}

fn form_create(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let session = session_mut(state)?;
    let kind = entity_param(&req.params)?;
    apply_values(session, kind, req)?;
    let out = session.create(kind)?;
    Ok(outcome_json(session, kind, out))
}

fn form_update(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let session = session_mut(state)?;
    let kind = entity_param(&req.params)?;
    apply_values(session, kind, req)?;
    let out = session.update(kind)?;
    Ok(outcome_json(session, kind, out))
}

fn form_delete(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let session = session_mut(state)?;
    let kind = entity_param(&req.params)?;
    let out = session.delete(kind)?;
    Ok(outcome_json(session, kind, out))
}

fn form_refresh(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let session = session_mut(state)?;
    let kind = entity_param(&req.params)?;
    let refreshed = session.refresh(kind)?;
    let rows = session.list_rows(kind)?;
    let refreshed: Vec<&str> = refreshed.iter().map(|k| k.as_str()).collect();
    Ok(json!({
        "rows": rows,
        "refreshed": refreshed,
        "form": form_view(session, kind),
    }))
}

fn choices_get(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let session = session(state)?;
    let kind = entity_param(&req.params)?;
    let attr = attr_param(&req.params, kind)?;
    let Some(d) = fields::descriptor(kind, attr) else {
        return Err(HandlerErr::bad_params(format!(
            "{} is not a field of {}",
            attr.as_str(),
            kind.as_str()
        )));
    };
    let Some((target, _)) = d.kind.reference() else {
        return Err(HandlerErr::bad_params(format!(
            "{} is not a choice field",
            attr.as_str()
        )));
    };
    let options = session
        .field_choices(kind, attr)
        .map(|set| json!(set.options()))
        .unwrap_or_else(|| json!([]));
    Ok(json!({
        "entity": kind.as_str(),
        "field": attr.as_str(),
        "target": target.as_str(),
        "filter": session.form(kind).active_filter(),
        "options": options,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "form.open" => form_open(state, req),
        "form.setField" => form_set_field(state, req),
        "form.selectRow" => form_select_row(state, req),
        "form.validate" => form_validate(state, req),
        "form.create" => form_create(state, req),
        "form.update" => form_update(state, req),
        "form.delete" => form_delete(state, req),
        "form.refresh" => form_refresh(state, req),
        "choices.get" => choices_get(state, req),
        _ => return None,
    };
    if let Err(e) = &result {
        log::debug!("{} failed: {} {}", req.method, e.code, e.message);
    }
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
