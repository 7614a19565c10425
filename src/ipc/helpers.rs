use crate::error::EngineError;
use crate::forms::RawInputs;
use crate::ipc::error::err;
use crate::ipc::types::AppState;
use crate::schema::{Attr, EntityKind};
use crate::session::Session;
use serde_json::{json, Value};

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        HandlerErr {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }
}

impl From<EngineError> for HandlerErr {
    fn from(e: EngineError) -> Self {
        if e.is_validation() {
            log::debug!("rejected input: {e}");
        } else {
            log::warn!("{e}");
        }
        HandlerErr {
            code: e.code(),
            message: e.to_string(),
            details: e.details(),
        }
    }
}

impl From<anyhow::Error> for HandlerErr {
    fn from(e: anyhow::Error) -> Self {
        HandlerErr {
            code: "db_query_failed",
            message: format!("{e:#}"),
            details: None,
        }
    }
}

pub fn session(state: &AppState) -> Result<&Session, HandlerErr> {
    state.session().ok_or_else(no_workspace)
}

pub fn session_mut(state: &mut AppState) -> Result<&mut Session, HandlerErr> {
    state.session_mut().ok_or_else(no_workspace)
}

fn no_workspace() -> HandlerErr {
    HandlerErr {
        code: "no_workspace",
        message: "select a workspace first".to_string(),
        details: None,
    }
}

pub fn entity_param(params: &Value) -> Result<EntityKind, HandlerErr> {
    let Some(raw) = params.get("entity").and_then(|v| v.as_str()) else {
        return Err(HandlerErr::bad_params("missing entity"));
    };
    EntityKind::parse(raw.trim()).ok_or_else(|| HandlerErr {
        code: "bad_params",
        message: format!("unknown entity: {}", raw),
        details: Some(json!({ "entity": raw })),
    })
}

pub fn id_param(params: &Value, key: &str) -> Result<i64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Field name as an attribute of `kind`'s form.
pub fn attr_param(params: &Value, kind: EntityKind) -> Result<Attr, HandlerErr> {
    let Some(raw) = params.get("field").and_then(|v| v.as_str()) else {
        return Err(HandlerErr::bad_params("missing field"));
    };
    parse_attr(kind, raw)
}

fn parse_attr(kind: EntityKind, raw: &str) -> Result<Attr, HandlerErr> {
    Attr::parse(raw)
        .ok_or_else(|| {
            EngineError::UnknownField {
                entity: kind,
                field: raw.to_string(),
            }
            .into()
        })
}

/// Raw input text for a JSON value. Numbers are rendered as typed, null is empty.
pub fn raw_text(v: &Value, key: &str) -> Result<String, HandlerErr> {
    match v {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(HandlerErr::bad_params(format!(
            "{} must be a string, number or null",
            key
        ))),
    }
}

/// Optional `values` object sent alongside a form action.
pub fn values_param(params: &Value, kind: EntityKind) -> Result<Option<RawInputs>, HandlerErr> {
    let Some(v) = params.get("values") else {
        return Ok(None);
    };
    if v.is_null() {
        return Ok(None);
    }
    let Some(obj) = v.as_object() else {
        return Err(HandlerErr::bad_params("values must be an object"));
    };
    let mut inputs = RawInputs::new();
    for (k, raw) in obj {
        let attr = parse_attr(kind, k)?;
        inputs.insert(attr, raw_text(raw, k)?);
    }
    Ok(Some(inputs))
}
