//! RPC procedure router.
//!
//! Procedure paths are decoded once into [`Procedure`]; the router then
//! checks method and authorization, decodes the input and runs the
//! procedure.
//!
//! # Procedures
//!
//! | path                     | kind     | access    |
//! |--------------------------|----------|-----------|
//! | `post.all`               | query    | public    |
//! | `post.byId`              | query    | public    |
//! | `post.create`            | mutation | protected |
//! | `post.delete`            | mutation | protected |
//! | `auth.getSession`        | query    | public    |
//! | `auth.getSecretMessage`  | query    | protected |
//! | `auth.signOut`           | mutation | protected |

use crate::context::RpcContext;
use crate::error::{Result, RpcError};
use crate::procedures::{auth, post};
use crate::providers::PostRepository;
use acme_auth::SessionStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Number of posts `post.all` returns.
pub const DEFAULT_LATEST_LIMIT: usize = 10;

/// Query (`GET`) or mutation (`POST`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
    /// Read-only, called with `GET`.
    Query,
    /// State changing, called with `POST`.
    Mutation,
}

impl fmt::Display for ProcedureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => f.write_str("query"),
            Self::Mutation => f.write_str("mutation"),
        }
    }
}

/// Every registered procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Procedure {
    /// `post.all`
    PostAll,
    /// `post.byId`
    PostById,
    /// `post.create`
    PostCreate,
    /// `post.delete`
    PostDelete,
    /// `auth.getSession`
    AuthGetSession,
    /// `auth.getSecretMessage`
    AuthGetSecretMessage,
    /// `auth.signOut`
    AuthSignOut,
}

impl Procedure {
    /// All procedures, in registration order.
    pub const ALL: [Self; 7] = [
        Self::PostAll,
        Self::PostById,
        Self::PostCreate,
        Self::PostDelete,
        Self::AuthGetSession,
        Self::AuthGetSecretMessage,
        Self::AuthSignOut,
    ];

    /// Decode a dotted procedure path. Case sensitive.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.path() == path)
    }

    /// Dotted path.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::PostAll => "post.all",
            Self::PostById => "post.byId",
            Self::PostCreate => "post.create",
            Self::PostDelete => "post.delete",
            Self::AuthGetSession => "auth.getSession",
            Self::AuthGetSecretMessage => "auth.getSecretMessage",
            Self::AuthSignOut => "auth.signOut",
        }
    }

    /// Query or mutation.
    #[must_use]
    pub const fn kind(self) -> ProcedureKind {
        match self {
            Self::PostAll | Self::PostById | Self::AuthGetSession | Self::AuthGetSecretMessage => {
                ProcedureKind::Query
            }
            Self::PostCreate | Self::PostDelete | Self::AuthSignOut => ProcedureKind::Mutation,
        }
    }

    /// `true` if the procedure requires a session.
    #[must_use]
    pub const fn is_protected(self) -> bool {
        matches!(
            self,
            Self::PostCreate | Self::PostDelete | Self::AuthGetSecretMessage | Self::AuthSignOut
        )
    }
}

/// The application's procedure table.
#[derive(Debug, Clone)]
pub struct RpcRouter {
    latest_limit: usize,
}

impl RpcRouter {
    /// Router with default limits.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latest_limit: DEFAULT_LATEST_LIMIT,
        }
    }

    /// Set how many posts `post.all` returns.
    #[must_use]
    pub const fn with_latest_limit(mut self, limit: usize) -> Self {
        self.latest_limit = limit;
        self
    }

    /// Run the procedure at `path`.
    ///
    /// `input` is the already parsed JSON input, `None` when the call had
    /// none.
    ///
    /// # Errors
    ///
    /// - `NOT_FOUND` for an unknown path
    /// - `METHOD_NOT_SUPPORTED` when `kind` does not match the procedure
    /// - `UNAUTHORIZED` for a protected procedure without a session
    /// - `BAD_REQUEST` when the input does not fit the procedure
    /// - whatever the procedure itself returns
    pub async fn call<P, S>(
        &self,
        ctx: &RpcContext<P, S>,
        kind: ProcedureKind,
        path: &str,
        input: Option<Value>,
    ) -> Result<Value>
    where
        P: PostRepository,
        S: SessionStore,
    {
        let procedure =
            Procedure::from_path(path).ok_or_else(|| RpcError::procedure_not_found(path))?;

        if procedure.kind() != kind {
            let method = match kind {
                ProcedureKind::Query => "GET",
                ProcedureKind::Mutation => "POST",
            };
            return Err(RpcError::method_not_supported(format!(
                "Unsupported {method}-request to {} procedure at path \"{path}\"",
                procedure.kind()
            )));
        }

        if procedure.is_protected() && ctx.session().is_none() {
            return Err(RpcError::unauthorized());
        }

        metrics::counter!("rpc.calls.total", "path" => procedure.path()).increment(1);

        match procedure {
            Procedure::PostAll => to_output(&post::all(ctx, self.latest_limit).await?),
            Procedure::PostById => to_output(&post::by_id(ctx, decode(input)?).await?),
            Procedure::PostCreate => to_output(&post::create(ctx, decode(input)?).await?),
            Procedure::PostDelete => to_output(&post::delete(ctx, decode(input)?).await?),
            Procedure::AuthGetSession => to_output(&auth::get_session(ctx)),
            Procedure::AuthGetSecretMessage => to_output(&auth::get_secret_message()),
            Procedure::AuthSignOut => to_output(&auth::sign_out(ctx).await?),
        }
    }
}

impl Default for RpcRouter {
    fn default() -> Self {
        Self::new()
    }
}

fn decode<T: DeserializeOwned>(input: Option<Value>) -> Result<T> {
    serde_json::from_value(input.unwrap_or(Value::Null))
        .map_err(|e| RpcError::bad_request(format!("Invalid input: {e}")))
}

fn to_output<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| RpcError::internal(format!("Failed to serialize output: {e}")))
}
