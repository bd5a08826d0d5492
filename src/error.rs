use std::time::Duration;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use thiserror::Error;

use crate::database::StoreError;
use crate::hierarchy::{RoleType, ValidationIssue};
use crate::services::identity::IdentityError;

/// Errors surfaced by the directory, provisioning service and auditor
#[derive(Debug, Error)]
pub enum OrgError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {}", summarize(.errors))]
    ValidationFailed {
        errors: Vec<ValidationIssue>,
        suggested_role: Option<RoleType>,
    },

    #[error("Upstream failure during {context}: {source}")]
    UpstreamFailure {
        context: String,
        #[source]
        source: UpstreamCause,
    },

    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Original cause attached to an upstream failure
#[derive(Debug, Error)]
pub enum UpstreamCause {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl OrgError {
    pub fn upstream(context: impl Into<String>, cause: impl Into<UpstreamCause>) -> Self {
        OrgError::UpstreamFailure {
            context: context.into(),
            source: cause.into(),
        }
    }

    pub fn validation(errors: Vec<ValidationIssue>) -> Self {
        OrgError::ValidationFailed {
            errors,
            suggested_role: None,
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, OrgError::UpstreamFailure { .. })
    }
}

fn summarize(errors: &[ValidationIssue]) -> String {
    errors
        .iter()
        .map(|issue| issue.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 422 Unprocessable Entity (request understood, rejected by policy)
    ValidationFailed {
        message: String,
        issues: Vec<ValidationIssue>,
        suggested_role: Option<RoleType>,
    },

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (identity provider or store failed)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::ValidationFailed { .. } => 422,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::ValidationFailed { message, .. } => message,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::ValidationFailed { .. } => "VALIDATION_FAILED",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationFailed {
                message,
                issues,
                suggested_role,
            } => json!({
                "success": false,
                "error": message,
                "code": self.error_code(),
                "validation_errors": issues,
                "suggested_role": suggested_role,
            }),
            _ => json!({
                "success": false,
                "error": self.message(),
                "code": self.error_code(),
            }),
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

impl From<OrgError> for ApiError {
    fn from(err: OrgError) -> Self {
        match err {
            OrgError::NotFound(msg) => ApiError::NotFound(msg),
            OrgError::ValidationFailed {
                errors,
                suggested_role,
            } => ApiError::ValidationFailed {
                message: "Request rejected by hierarchy policy".to_string(),
                issues: errors,
                suggested_role,
            },
            OrgError::UpstreamFailure { context, source } => {
                tracing::error!("Upstream failure during {}: {}", context, source);
                match source {
                    UpstreamCause::Timeout(_) => {
                        ApiError::ServiceUnavailable(format!("{} timed out, please retry", context))
                    }
                    _ => ApiError::BadGateway(format!("{} failed", context)),
                }
            }
            OrgError::IntegrityViolation(msg) => {
                // Already logged where detected; clients get the description
                ApiError::InternalServerError(msg)
            }
            OrgError::Forbidden(msg) => ApiError::Forbidden(msg),
            OrgError::Conflict(msg) => ApiError::Conflict(msg),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
