//! In-memory post repository.

use crate::error::{Result, RpcError};
use crate::post::{NewPost, Post};
use crate::providers::PostRepository;
use chrono::Utc;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Posts kept in a map ordered by id.
///
/// Ids are UUIDv7, so map order is creation order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPostRepository {
    posts: Arc<Mutex<BTreeMap<Uuid, Post>>>,
}

impl InMemoryPostRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored posts.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(lock(&self.posts)?.len())
    }

    /// `true` when no post is stored.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(lock(&self.posts)?.is_empty())
    }
}

fn lock(posts: &Mutex<BTreeMap<Uuid, Post>>) -> Result<MutexGuard<'_, BTreeMap<Uuid, Post>>> {
    posts
        .lock()
        .map_err(|_| RpcError::internal("Mutex lock failed"))
}

impl PostRepository for InMemoryPostRepository {
    fn latest(&self, limit: usize) -> impl Future<Output = Result<Vec<Post>>> + Send {
        let posts = Arc::clone(&self.posts);

        async move { Ok(lock(&posts)?.values().rev().take(limit).cloned().collect()) }
    }

    fn find(&self, id: Uuid) -> impl Future<Output = Result<Option<Post>>> + Send {
        let posts = Arc::clone(&self.posts);

        async move { Ok(lock(&posts)?.get(&id).cloned()) }
    }

    fn insert(&self, post: NewPost) -> impl Future<Output = Result<Post>> + Send {
        let posts = Arc::clone(&self.posts);

        async move {
            let post = Post {
                id: Uuid::now_v7(),
                title: post.title,
                content: post.content,
                created_at: Utc::now(),
                updated_at: None,
            };
            lock(&posts)?.insert(post.id, post.clone());
            Ok(post)
        }
    }

    fn delete(&self, id: Uuid) -> impl Future<Output = Result<()>> + Send {
        let posts = Arc::clone(&self.posts);

        async move {
            lock(&posts)?.remove(&id);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn new_post(title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: "content".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_find_delete() {
        let repo = InMemoryPostRepository::new();

        let post = repo.insert(new_post("Hello")).await.unwrap();
        assert_eq!(repo.find(post.id).await.unwrap(), Some(post.clone()));

        repo.delete(post.id).await.unwrap();
        assert_eq!(repo.find(post.id).await.unwrap(), None);
        repo.delete(post.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_latest_is_newest_first_and_limited() {
        let repo = InMemoryPostRepository::new();
        for i in 0..12 {
            repo.insert(new_post(&format!("post {i}"))).await.unwrap();
        }

        let latest = repo.latest(10).await.unwrap();

        assert_eq!(latest.len(), 10);
        assert_eq!(latest[0].title, "post 11");
        assert_eq!(latest[9].title, "post 2");
        assert_eq!(repo.len().unwrap(), 12);
    }
}
