use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const VALIDATION_FAILED: &str = "Validation failed";
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";
pub const PAYLOAD_TOO_LARGE: &str = "Payload too large";

/// Field name to the messages reported against it, ordered by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Error body returned by the intake endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<FieldErrors>,
}

impl ApiError {
    pub fn validation(details: FieldErrors) -> Self {
        Self {
            error: VALIDATION_FAILED.to_string(),
            details: Some(details),
        }
    }

    pub fn internal() -> Self {
        Self {
            error: INTERNAL_SERVER_ERROR.to_string(),
            details: None,
        }
    }

    pub fn payload_too_large() -> Self {
        Self {
            error: PAYLOAD_TOO_LARGE.to_string(),
            details: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed for {}", .field_errors.keys().cloned().collect::<Vec<_>>().join(", "))]
pub struct ValidationError {
    pub field_errors: FieldErrors,
}

impl ValidationError {
    pub fn new(field_errors: FieldErrors) -> Self {
        Self { field_errors }
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut field_errors = FieldErrors::new();
        field_errors.insert(field.into(), vec![message.into()]);
        Self { field_errors }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.field_errors.contains_key(field)
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::validation(value.field_errors)
    }
}
