use crate::ipc::error::ok;
use crate::error::EngineError;
use crate::ipc::helpers::{session, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::report::{self, AVERAGE_BELOW, WEAK_BELOW};
use serde_json::json;

fn student_average(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let session = session(state)?;
    let student_id = match req.params.get("studentId") {
        None | Some(serde_json::Value::Null) => {
            return Err(HandlerErr::bad_params("missing studentId"))
        }
        Some(serde_json::Value::String(raw)) => report::parse_student_id(raw)?,
        Some(v) => v.as_i64().ok_or_else(|| EngineError::TypeError {
            field: "studentId".to_string(),
            expected: "an integer",
        })?,
    };
    let avg = report::student_average(session.conn(), student_id)?;
    let mut out = serde_json::to_value(&avg).map_err(anyhow::Error::from)?;
    out["bands"] = json!({
        "weakBelow": WEAK_BELOW,
        "averageBelow": AVERAGE_BELOW,
    });
    Ok(out)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "reports.studentAverage" => student_average(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
