// crates/federation-server/src/error.rs
// ============================================================================
// Module: Server Errors
// Description: Startup errors and HTTP error responses.
// Purpose: Map broker outcomes onto stable HTTP statuses and JSON bodies.
// Dependencies: axum, serde, thiserror, federation-core
// ============================================================================

//! ## Overview
//! [`ServerError`] covers failures before the listener accepts requests.
//! [`ApiError`] is the per-request error rendered as
//! `{"status": <code>, "error": <reason phrase>, "message": <text>}`.
//! Status mapping:
//! - configuration: 404
//! - permission: 403
//! - upstream AWS: 502
//! - identity source or anything else: 500

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use federation_core::FederationError;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Startup Errors
// ============================================================================

/// Errors raised while building or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: API Errors
// ============================================================================

/// JSON body of an error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// Numeric HTTP status.
    status: u16,
    /// Reason phrase for the status.
    error: &'static str,
    /// Human-readable failure description.
    message: String,
}

/// Per-request error carrying an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    /// Response status.
    pub status: StatusCode,
    /// Error message returned to the caller.
    pub message: String,
}

impl ApiError {
    /// Builds an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<FederationError> for ApiError {
    fn from(err: FederationError) -> Self {
        let status = match &err {
            FederationError::Configuration(_) => StatusCode::NOT_FOUND,
            FederationError::Permission(_) => StatusCode::FORBIDDEN,
            FederationError::Aws(_) => StatusCode::BAD_GATEWAY,
            FederationError::IdentitySource(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: self.status.as_u16(),
            error: self.status.canonical_reason().unwrap_or("Unknown"),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
