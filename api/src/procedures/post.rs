//! `post.*` procedures.

use crate::context::RpcContext;
use crate::error::Result;
use crate::post::{NewPost, Post};
use crate::providers::PostRepository;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Input of `post.byId`.
#[derive(Debug, Clone, Deserialize)]
pub struct ByIdInput {
    /// Post id.
    pub id: String,
}

/// Output of `post.delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteResult {
    /// Always `true` once the call returns.
    pub success: bool,
}

/// `post.all`: newest posts first.
///
/// # Errors
///
/// Propagates repository failures.
pub async fn all<P: PostRepository, S>(ctx: &RpcContext<P, S>, limit: usize) -> Result<Vec<Post>> {
    ctx.posts.latest(limit).await
}

/// `post.byId`: the post, or `None`. An id that is not a UUID matches nothing.
///
/// # Errors
///
/// Propagates repository failures.
pub async fn by_id<P: PostRepository, S>(
    ctx: &RpcContext<P, S>,
    input: ByIdInput,
) -> Result<Option<Post>> {
    match Uuid::parse_str(&input.id) {
        Ok(id) => ctx.posts.find(id).await,
        Err(_) => Ok(None),
    }
}

/// `post.create`: validate and insert.
///
/// # Errors
///
/// Returns `BAD_REQUEST` with field errors for invalid input; propagates
/// repository failures.
pub async fn create<P: PostRepository, S>(ctx: &RpcContext<P, S>, input: NewPost) -> Result<Post> {
    input.validate()?;
    let post = ctx.posts.insert(input).await?;
    tracing::info!(post_id = %post.id, "Post created");
    Ok(post)
}

/// `post.delete`: delete by id.
///
/// # Errors
///
/// Propagates repository failures.
pub async fn delete<P: PostRepository, S>(ctx: &RpcContext<P, S>, id: String) -> Result<DeleteResult> {
    if let Ok(id) = Uuid::parse_str(&id) {
        ctx.posts.delete(id).await?;
        tracing::info!(post_id = %id, "Post deleted");
    }
    Ok(DeleteResult { success: true })
}
