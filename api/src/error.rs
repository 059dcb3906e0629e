//! RPC error types.
//!
//! Procedure failures are values: they are rendered into the error envelope
//! and answered with the code's HTTP status. Only [`TransportError`] escapes
//! the adapter.

use acme_web::AppError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type alias for procedures.
pub type Result<T> = std::result::Result<T, RpcError>;

/// Error codes understood by RPC clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcErrorCode {
    /// Input was not valid JSON.
    ParseError,
    /// Input did not match the procedure's schema.
    BadRequest,
    /// Protected procedure called without a session.
    Unauthorized,
    /// No such procedure.
    NotFound,
    /// Query called with `POST` or mutation with `GET`.
    MethodNotSupported,
    /// Anything else.
    InternalServerError,
}

impl RpcErrorCode {
    /// Wire name of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParseError => "PARSE_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotSupported => "METHOD_NOT_SUPPORTED",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    /// HTTP status a response carrying only this error gets.
    #[must_use]
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::ParseError | Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotSupported => StatusCode::METHOD_NOT_ALLOWED,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Per-field validation messages, keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// A procedure failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RpcError {
    /// Error code.
    pub code: RpcErrorCode,
    /// Human readable message.
    pub message: String,
    /// Validation messages when `code` is `BAD_REQUEST`.
    pub field_errors: Option<FieldErrors>,
}

impl RpcError {
    /// Create an error with a code and message.
    #[must_use]
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field_errors: None,
        }
    }

    /// `PARSE_ERROR`.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::ParseError, message)
    }

    /// `BAD_REQUEST`.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::BadRequest, message)
    }

    /// `BAD_REQUEST` with per-field messages.
    #[must_use]
    pub fn validation(field_errors: FieldErrors) -> Self {
        Self {
            field_errors: Some(field_errors),
            ..Self::bad_request("Input validation failed")
        }
    }

    /// `UNAUTHORIZED`.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(RpcErrorCode::Unauthorized, "UNAUTHORIZED")
    }

    /// `NOT_FOUND` for an unknown procedure.
    #[must_use]
    pub fn procedure_not_found(path: &str) -> Self {
        Self::new(
            RpcErrorCode::NotFound,
            format!("No \"query\" or \"mutation\"-procedure on path \"{path}\""),
        )
    }

    /// `METHOD_NOT_SUPPORTED`.
    #[must_use]
    pub fn method_not_supported(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::MethodNotSupported, message)
    }

    /// `INTERNAL_SERVER_ERROR`.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InternalServerError, message)
    }
}

impl From<acme_auth::AuthError> for RpcError {
    fn from(err: acme_auth::AuthError) -> Self {
        tracing::error!(error = %err, "Session store failed");
        Self::internal("Session service unavailable")
    }
}

/// Failure of the transport adapter itself.
///
/// Unlike [`RpcError`], nothing is written to the client for these; the shim
/// returns them and the framework answers with its default error response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request URL is not below the configured endpoint.
    #[error("Request path '{path}' is outside endpoint '{endpoint}'")]
    EndpointMismatch {
        /// Request path.
        path: String,
        /// Configured endpoint.
        endpoint: String,
    },

    /// The request body could not be read.
    #[error("Failed to read request body: {0}")]
    Body(String),

    /// The response could not be serialized.
    #[error("Failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl IntoResponse for TransportError {
    fn into_response(self) -> Response {
        AppError::internal("An internal error occurred")
            .with_source(self)
            .into_response()
    }
}
