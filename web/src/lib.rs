//! Shared Axum plumbing for the Acme API surface.
//!
//! Both public endpoints of the application, the auth bridge mounted at
//! `/api/auth` and the RPC endpoint mounted at `/api/trpc`, are built on the
//! pieces in this crate:
//!
//! - [`AppError`]: the framework default error response (JSON body, logged)
//! - [`middleware`]: correlation ID tracking and per-request tracing spans
//! - [`extractors`]: request metadata used in structured logs
//! - [`cors`]: the permissive cross-origin headers served by the RPC endpoint
//! - [`handlers`]: liveness endpoint
//!
//! # Request Flow
//!
//! ```text
//! client ──► correlation_id_layer ──► route handler ──► collaborator
//!                 │                        │
//!                 └── span + header        └── Result<Response, AppError>
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cors;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ClientIp, CorrelationId, UserAgent};
pub use middleware::{correlation_id_layer, CorrelationIdExt, CORRELATION_ID_HEADER};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
