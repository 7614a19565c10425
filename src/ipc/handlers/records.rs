use crate::ipc::error::ok;
use crate::ipc::helpers::{entity_param, id_param, session, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn records_list(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let session = session(state)?;
    let kind = entity_param(&req.params)?;
    let columns: Vec<serde_json::Value> = kind
        .columns()
        .iter()
        .map(|c| json!({ "label": c.label, "key": c.key_str() }))
        .collect();
    let rows = session.list_rows(kind)?;
    Ok(json!({
        "entity": kind.as_str(),
        "columns": columns,
        "rows": rows,
    }))
}

fn records_get(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let session = session(state)?;
    let kind = entity_param(&req.params)?;
    let id = id_param(&req.params, "id")?;
    let record = session.record_json(kind, id)?;
    Ok(json!({ "entity": kind.as_str(), "record": record }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "records.list" => records_list(state, req),
        "records.get" => records_get(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
