//! # Acme API
//!
//! The RPC endpoint (`/api/trpc/*`) and the procedures behind it.
//!
//! ## Layers
//!
//! ```text
//! transport   OPTIONS/GET/POST handlers, CORS, error logging
//!    │
//! adapter     request -> calls -> envelopes; handled vs rethrown errors
//!    │
//! router      procedure table: method, authorization, input decoding
//!    │
//! procedures  post.*, auth.* over RpcContext { session, posts, sessions }
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use acme_api::{trpc_router, InMemoryPostRepository, TransportState};
//! use std::sync::Arc;
//!
//! let state = TransportState::new(Arc::new(InMemoryPostRepository::new()), sessions);
//! let app = axum::Router::new().nest("/api/trpc", trpc_router(Arc::new(state)));
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod adapter;
pub mod context;
pub mod error;
pub mod post;
pub mod procedures;
pub mod providers;
pub mod router;
pub mod stores;
pub mod transport;

pub use adapter::{fetch_request_handler, ErrorDisposition, FetchHandlerOptions, RpcErrorEvent};
pub use context::{create_context, RpcContext};
pub use error::{Result, RpcError, RpcErrorCode, TransportError};
pub use post::{NewPost, Post};
pub use providers::PostRepository;
pub use router::{Procedure, ProcedureKind, RpcRouter};
pub use stores::InMemoryPostRepository;
pub use transport::{trpc_router, TransportState, DEFAULT_ENDPOINT};
