//! Record identifiers
//!
//! Every record is keyed by a hyphenated lowercase UUID string.

use uuid::Uuid;

use crate::error::EngineError;

/// Generate a fresh record id
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Validate a caller-supplied id and normalize it to the stored form
pub fn parse_id(kind: &str, raw: &str) -> Result<String, EngineError> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.hyphenated().to_string())
        .map_err(|_| EngineError::invalid(format!("Invalid {kind} ID format")))
}
