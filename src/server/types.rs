//! Type definitions for the HTTP server.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::advisory::Advisor;
use crate::engine::Engine;
use crate::error::EngineError;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct ApiState {
    pub engine: Engine,
    pub advisor: Arc<dyn Advisor>,
}

/// A JSON response, independent of the socket layer
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ApiResponse {
    pub fn ok(body: serde_json::Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16, reason: &str, details: impl Into<String>) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": reason, "details": details.into() }),
        }
    }
}

/// Why a request was rejected
#[derive(Debug)]
pub enum ApiError {
    Engine(EngineError),
    /// Body or query string could not be decoded
    BadRequest {
        reason: &'static str,
        details: String,
    },
    NotFound,
    MethodNotAllowed,
    /// Response could not be serialized
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

impl ApiError {
    pub fn invalid_json(err: impl std::fmt::Display) -> Self {
        Self::BadRequest {
            reason: "invalid_json",
            details: err.to_string(),
        }
    }

    pub fn invalid_query(err: impl std::fmt::Display) -> Self {
        Self::BadRequest {
            reason: "invalid_query",
            details: err.to_string(),
        }
    }

    pub fn into_response(self, method: &str, path: &str) -> ApiResponse {
        match self {
            Self::Engine(err) => {
                let status = status_for(&err);
                if status >= 500 {
                    error!("[trailquest:http] {} {} failed: {}", method, path, err);
                } else {
                    warn!("[trailquest:http] {} {} rejected: {}", method, path, err);
                }
                ApiResponse::error(status, err.reason(), err.to_string())
            }
            Self::BadRequest { reason, details } => {
                warn!("[trailquest:http] {} {} rejected: {}", method, path, details);
                ApiResponse::error(400, reason, details)
            }
            Self::NotFound => ApiResponse::error(404, "not_found", format!("no route for {path}")),
            Self::Internal(details) => {
                error!("[trailquest:http] {} {} failed: {}", method, path, details);
                ApiResponse::error(500, "internal", details)
            }
            Self::MethodNotAllowed => ApiResponse::error(
                405,
                "method_not_allowed",
                format!("{method} not allowed on {path}"),
            ),
        }
    }
}

/// HTTP status for an engine error
pub fn status_for(err: &EngineError) -> u16 {
    match err {
        EngineError::NotFound { .. } => 404,
        EngineError::InvalidArgument(_) | EngineError::InsufficientFunds { .. } => 400,
        EngineError::Conflict(_) => 409,
        EngineError::AdvisoryUnavailable(_) => 503,
        EngineError::Storage(_) => 500,
    }
}

pub type HandlerResult = Result<ApiResponse, ApiError>;

// ============================================================================
// Request payloads
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimRequest {
    pub user_id: String,
    pub item_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub user_context: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatusQuery {
    pub status: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsQuery {
    pub difficulty: Option<String>,
    pub ai_suggested: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerQuery {
    pub trigger: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&EngineError::not_found("User", "x")), 404);
        assert_eq!(status_for(&EngineError::invalid("x")), 400);
        assert_eq!(
            status_for(&EngineError::InsufficientFunds {
                needed: 2,
                available: 1
            }),
            400
        );
        assert_eq!(status_for(&EngineError::Conflict("busy".to_string())), 409);
    }

    #[test]
    fn test_error_body_shape() {
        let resp = ApiError::from(EngineError::not_found("Task", "t1")).into_response("GET", "/x");
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body["error"], "not_found");
        assert_eq!(resp.body["details"], "Task not found: t1");
    }
}
