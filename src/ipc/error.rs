use serde::Serialize;
use serde_json::{json, Value};

/// One response line. Exactly one of `result` and `error` is present.
#[derive(Serialize)]
struct Envelope<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody<'a>>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl<'a> Envelope<'a> {
    fn failure(id: Option<&'a str>, code: &'a str, message: String, details: Option<Value>) -> Self {
        Envelope {
            id,
            ok: false,
            result: None,
            error: Some(ErrorBody {
                code,
                message,
                details,
            }),
        }
    }

    fn into_value(self) -> Value {
        serde_json::to_value(&self).unwrap_or_else(|e| {
            log::error!("response serialization failed: {e}");
            json!({ "ok": false })
        })
    }
}

pub fn ok(id: &str, result: Value) -> Value {
    Envelope {
        id: Some(id),
        ok: true,
        result: Some(result),
        error: None,
    }
    .into_value()
}

pub fn err(id: &str, code: &str, message: impl Into<String>, details: Option<Value>) -> Value {
    Envelope::failure(Some(id), code, message.into(), details).into_value()
}

/// Reply to a line that did not parse as a request, so there is no id to echo.
pub fn bad_json(message: impl Into<String>) -> Value {
    Envelope::failure(None, "bad_json", message.into(), None).into_value()
}
