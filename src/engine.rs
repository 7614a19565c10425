use crate::catalog::Catalog;
use crate::choices::ChoiceCache;
use crate::error::EngineError;
use crate::fields::{self, FieldDescriptor, FieldKind};
use crate::forms::RawInputs;
use crate::schema::{EntityKind, FieldValue, Payload};

/// Parses raw inputs into a typed payload, in descriptor order.
///
/// Stops at the first failing field. Foreign-key inputs must be tokens present
/// in the cached choice set for `(target, filter)`; unfiltered foreign keys
/// always look up the unfiltered set, filtered ones use `active_filter`.
pub fn validate(
    kind: EntityKind,
    inputs: &RawInputs,
    active_filter: Option<&str>,
    catalog: &Catalog,
    choices: &ChoiceCache,
) -> Result<Payload, EngineError> {
    let mut payload = Payload::new();
    for d in fields::descriptors(kind) {
        if matches!(d.kind, FieldKind::DisciplineFilter) {
            continue;
        }
        let raw = inputs.get(&d.attr).map(|s| s.trim()).unwrap_or("");
        let value = parse_field(d, raw, active_filter, catalog, choices)?;
        payload.insert(d.attr, value);
    }
    Ok(payload)
}

fn parse_field(
    d: &FieldDescriptor,
    raw: &str,
    active_filter: Option<&str>,
    catalog: &Catalog,
    choices: &ChoiceCache,
) -> Result<FieldValue, EngineError> {
    let field = || d.attr.as_str().to_string();

    if raw.is_empty() {
        return if d.kind.is_optional() {
            Ok(FieldValue::Null)
        } else {
            Err(EngineError::MissingField { field: field() })
        };
    }

    match d.kind {
        FieldKind::Text | FieldKind::OptionalText => Ok(FieldValue::Text(raw.to_string())),
        FieldKind::Integer { min } => {
            let v = parse_integer(d, raw)?;
            if let Some(min) = min {
                if v < min {
                    return Err(EngineError::FormatError {
                        field: field(),
                        message: format!("must be at least {}", min),
                    });
                }
            }
            Ok(FieldValue::Integer(v))
        }
        FieldKind::OptionalInteger => Ok(FieldValue::Integer(parse_integer(d, raw)?)),
        FieldKind::Real { range } | FieldKind::OptionalReal { range } => {
            let v = raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| EngineError::TypeError {
                    field: field(),
                    expected: "a number",
                })?;
            if let Some((lo, hi)) = range {
                if v < lo || v > hi {
                    return Err(EngineError::FormatError {
                        field: field(),
                        message: format!("must be between {} and {}", lo, hi),
                    });
                }
            }
            Ok(FieldValue::Real(v))
        }
        FieldKind::DigitCode { len } => {
            if raw.len() != len || !raw.bytes().all(|b| b.is_ascii_digit()) {
                return Err(EngineError::FormatError {
                    field: field(),
                    message: format!("must be exactly {} digits (e.g. 012)", len),
                });
            }
            Ok(FieldValue::Text(raw.to_string()))
        }
        FieldKind::Enumerated(list) => {
            if catalog.options(list).iter().any(|o| o == raw) {
                Ok(FieldValue::Text(raw.to_string()))
            } else {
                Err(EngineError::InvalidSelection { field: field() })
            }
        }
        FieldKind::ForeignKey { target, .. } => resolve_token(target, None, raw, choices)
            .ok_or_else(|| EngineError::InvalidSelection { field: field() }),
        FieldKind::FilteredForeignKey { target, .. } => {
            resolve_token(target, active_filter, raw, choices)
                .ok_or_else(|| EngineError::InvalidSelection { field: field() })
        }
        FieldKind::DisciplineFilter => Ok(FieldValue::Null),
    }
}

fn parse_integer(d: &FieldDescriptor, raw: &str) -> Result<i64, EngineError> {
    raw.parse::<i64>().map_err(|_| EngineError::TypeError {
        field: d.attr.as_str().to_string(),
        expected: "an integer",
    })
}

fn resolve_token(
    target: EntityKind,
    filter: Option<&str>,
    token: &str,
    choices: &ChoiceCache,
) -> Option<FieldValue> {
    choices
        .get(target, filter)
        .and_then(|set| set.resolve(token))
        .map(FieldValue::Integer)
}
