use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{session, session_mut, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

#[derive(Clone, Copy)]
enum SetupSection {
    Catalog,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "catalog" => Some(Self::Catalog),
            _ => None,
        }
    }
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session(state) {
        Ok(s) => s,
        Err(e) => return e.response(&req.id),
    };
    ok(&req.id, json!({ "catalog": session.catalog() }))
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(state) {
        Ok(s) => s,
        Err(e) => return e.response(&req.id),
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    match section {
        SetupSection::Catalog => {
            let mut next = session.catalog().clone();
            if let Err(msg) = next.merge_patch(patch_obj) {
                return err(&req.id, "bad_params", msg, None);
            }
            if let Err(e) = session.set_catalog(next) {
                return HandlerErr {
                    code: "db_update_failed",
                    message: format!("{e:#}"),
                    details: None,
                }
                .response(&req.id);
            }
        }
    }
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
