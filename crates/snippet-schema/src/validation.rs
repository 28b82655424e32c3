//! Validate argument payloads against a generated input schema

use std::fmt;

use serde_json::Value;

use crate::errors::SchemaError;

/// One way in which a payload does not satisfy a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer to the offending value, empty for the payload itself
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Validate `payload` against a draft-04 `schema`, returning every violation.
///
/// An empty list means the payload is valid.
pub fn validate(schema: &Value, payload: &Value) -> Result<Vec<Violation>, SchemaError> {
    let validator =
        jsonschema::draft4::new(schema).map_err(|e| SchemaError::InvalidSchema(e.to_string()))?;

    Ok(validator
        .iter_errors(payload)
        .map(|error| Violation {
            path: error.instance_path.to_string(),
            message: error.to_string(),
        })
        .collect())
}
