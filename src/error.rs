//! Error kinds surfaced by the progression engine
//!
//! Every engine operation returns [`EngineError`]. The HTTP layer maps each
//! kind to a status code and the machine-readable [`EngineError::reason`].

use rusqlite::ErrorCode;

/// Error type for engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A user, activity or catalog identifier does not resolve
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Malformed identifier, out-of-enum value or invalid amount
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A debit would take the balance below zero
    #[error("Insufficient points: needed {needed}, available {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    /// Lost a race on a conditional update; the caller should retry
    #[error("Conflicting update, retry the request: {0}")]
    Conflict(String),

    /// The external advisory text service failed
    #[error("Advisory service unavailable: {0}")]
    AdvisoryUnavailable(String),

    /// Unexpected database failure
    #[error("Storage error: {0}")]
    Storage(rusqlite::Error),
}

impl EngineError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Machine-readable reason code used in API error bodies
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::Conflict(_) => "conflict",
            Self::AdvisoryUnavailable(_) => "advisory_unavailable",
            Self::Storage(_) => "storage",
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                Self::Conflict(err.to_string())
            }
            _ => Self::Storage(err),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
