use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::schema::EntityKind;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match state.open_workspace(path.clone()) {
        Ok(session) => {
            let mut counts = serde_json::Map::new();
            for kind in EntityKind::ALL {
                match session.store().count(kind) {
                    Ok(n) => {
                        counts.insert(kind.as_str().to_string(), json!(n));
                    }
                    Err(e) => return err(&req.id, e.code(), e.to_string(), e.details()),
                }
            }
            ok(
                &req.id,
                json!({ "workspacePath": path.to_string_lossy(), "counts": counts }),
            )
        }
        Err(e) => {
            log::error!("opening workspace {} failed: {e:#}", path.to_string_lossy());
            err(&req.id, "db_open_failed", format!("{e:#}"), None)
        }
    }
}

fn handle_workspace_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    let was_open = state.close_workspace();
    ok(&req.id, json!({ "closed": was_open }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "workspace.close" => Some(handle_workspace_close(state, req)),
        _ => None,
    }
}
