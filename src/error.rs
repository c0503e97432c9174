//! # Error Handling
//!
//! This module defines the application error type and how each variant is
//! converted to an HTTP response. Every handler returns `Result<_, AppError>`
//! and actix-web uses the `ResponseError` impl below to render failures as a
//! structured JSON payload — clients always get a human-readable message and
//! never a stack trace.
//!
//! ## Error Categories:
//! - **Validation**: the client sent something malformed or of the wrong kind
//!   (e.g. a `text/plain` upload to the video endpoint) — 400
//! - **NotFound**: a video id that resolves to no file on transient storage — 404
//! - **UpstreamAuth**: the remote download source demands sign-in credentials
//!   the server was not configured with; the message carries remediation
//!   guidance, and it is the client's problem to fix — 400
//! - **Upstream**: the external model or download service failed for any other
//!   reason; the original message is preserved in the detail — 500
//! - **Internal**: any other uncaught failure during orchestration — 500
//! - **Config**: configuration loading or validation problems — 500

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

/// Custom error types for the application.
///
/// Validation and not-found errors short-circuit immediately and are never
/// retried. Upstream failures are not retried by the server either — callers
/// may retry the whole request. Cleanup failures never appear here at all:
/// they are logged and swallowed so they cannot mask a primary result.
#[derive(Debug)]
pub enum AppError {
    /// Client sent invalid or wrong-kind data
    Validation(String),

    /// Requested artifact does not exist on transient storage
    NotFound(String),

    /// Remote source requires credentials the server does not have
    UpstreamAuth(String),

    /// External model or download service failed
    Upstream(String),

    /// Internal server errors (filesystem failures, bugs, etc.)
    Internal(String),

    /// Configuration file or environment variable problems
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::UpstreamAuth(msg) => write!(f, "Upstream authentication required: {}", msg),
            AppError::Upstream(msg) => write!(f, "Upstream failure: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

/// Converts errors into the JSON error envelope clients see.
///
/// ## Response Format:
/// ```json
/// {
///   "error": {
///     "type": "not_found",
///     "message": "no video file for id abc123",
///     "timestamp": "2025-01-01T12:00:00Z"
///   }
/// }
/// ```
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_type, message) = match self {
            AppError::Validation(msg) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "validation_error",
                msg.clone(),
            ),
            AppError::NotFound(msg) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "not_found",
                msg.clone(),
            ),
            AppError::UpstreamAuth(msg) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "upstream_auth_error",
                msg.clone(),
            ),
            AppError::Upstream(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "upstream_error",
                msg.clone(),
            ),
            AppError::Internal(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                msg.clone(),
            ),
            AppError::Config(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
                msg.clone(),
            ),
        };

        HttpResponse::build(status).json(json!({
            "error": {
                "type": error_type,
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        }))
    }
}

/// Uncaught internal failures surface as 500s with the original message.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Filesystem failures during acquisition or playback are server-side.
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Malformed JSON from a client is a 400, not a 500.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON parsing error: {}", err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Shorthand for `Result<T, AppError>`.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_match_taxonomy() {
        use actix_web::http::StatusCode;

        let cases = [
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::UpstreamAuth("x".into()), StatusCode::BAD_REQUEST),
            (
                AppError::Upstream("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.error_response().status(), expected, "{err}");
        }
    }

    #[test]
    fn test_display_preserves_original_message() {
        let err = AppError::Upstream("quota exceeded".into());
        assert!(err.to_string().contains("quota exceeded"));
    }
}
