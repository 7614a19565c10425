use crate::schema::EntityKind;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{field} must not be empty")]
    MissingField { field: String },

    #[error("{field}: {message}")]
    FormatError { field: String, message: String },

    #[error("{field} must be {expected}")]
    TypeError {
        field: String,
        expected: &'static str,
    },

    #[error("the value chosen for {field} is not available (stale or not loaded)")]
    InvalidSelection { field: String },

    #[error("{entity:?} references a record that does not exist: {message}")]
    IntegrityError { entity: EntityKind, message: String },

    #[error("{entity:?} {id} is still referenced by other records")]
    DependencyError { entity: EntityKind, id: i64 },

    #[error("{entity:?} {id} not found")]
    NotFound { entity: EntityKind, id: i64 },

    #[error("no {entity:?} record is selected")]
    NoSelection { entity: EntityKind },

    #[error("{field} is not a field of {entity:?}")]
    UnknownField { entity: EntityKind, field: String },

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing_field",
            Self::FormatError { .. } => "format_error",
            Self::TypeError { .. } => "type_error",
            Self::InvalidSelection { .. } => "invalid_selection",
            Self::IntegrityError { .. } => "integrity_error",
            Self::DependencyError { .. } => "dependency_error",
            Self::NotFound { .. } => "not_found",
            Self::NoSelection { .. } => "no_selection",
            Self::UnknownField { .. } => "bad_params",
            Self::Storage(_) => "db_query_failed",
        }
    }

    /// Raised before any storage call; stored state is never touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::FormatError { .. }
                | Self::TypeError { .. }
                | Self::InvalidSelection { .. }
        )
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::MissingField { field }
            | Self::FormatError { field, .. }
            | Self::TypeError { field, .. }
            | Self::InvalidSelection { field } => Some(json!({ "field": field })),
            Self::IntegrityError { entity, .. } | Self::NoSelection { entity } => {
                Some(json!({ "entity": entity.as_str() }))
            }
            Self::DependencyError { entity, id } | Self::NotFound { entity, id } => {
                Some(json!({ "entity": entity.as_str(), "id": id }))
            }
            Self::UnknownField { entity, field } => {
                Some(json!({ "entity": entity.as_str(), "field": field }))
            }
            Self::Storage(_) => None,
        }
    }
}
