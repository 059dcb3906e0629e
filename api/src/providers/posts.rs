//! Post repository trait.

use crate::error::Result;
use crate::post::{NewPost, Post};
use std::future::Future;
use uuid::Uuid;

/// Post persistence.
///
/// # Implementation Notes
///
/// - Ids must be time ordered so `latest` can order by id.
/// - Deleting a missing post succeeds.
pub trait PostRepository: Send + Sync {
    /// Up to `limit` posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns an `INTERNAL_SERVER_ERROR` [`crate::RpcError`] if storage fails.
    fn latest(&self, limit: usize) -> impl Future<Output = Result<Vec<Post>>> + Send;

    /// Post by id.
    ///
    /// # Errors
    ///
    /// Returns an `INTERNAL_SERVER_ERROR` [`crate::RpcError`] if storage fails.
    fn find(&self, id: Uuid) -> impl Future<Output = Result<Option<Post>>> + Send;

    /// Insert a validated post and return it.
    ///
    /// # Errors
    ///
    /// Returns an `INTERNAL_SERVER_ERROR` [`crate::RpcError`] if storage fails.
    fn insert(&self, post: NewPost) -> impl Future<Output = Result<Post>> + Send;

    /// Delete by id.
    ///
    /// # Errors
    ///
    /// Returns an `INTERNAL_SERVER_ERROR` [`crate::RpcError`] if storage fails.
    fn delete(&self, id: Uuid) -> impl Future<Output = Result<()>> + Send;
}
