//! Post records and creation input.

use crate::error::{FieldErrors, RpcError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest accepted title or content, in characters.
pub const MAX_FIELD_CHARS: usize = 256;

/// Stored post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Time-ordered identifier; sorting by id sorts by creation.
    pub id: Uuid,
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input of `post.create`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewPost {
    /// Title, 1 to 256 characters.
    pub title: String,
    /// Body text, 1 to 256 characters.
    pub content: String,
}

impl NewPost {
    /// Check both fields, collecting every violation.
    ///
    /// # Errors
    ///
    /// Returns a `BAD_REQUEST` [`RpcError`] with per-field messages.
    pub fn validate(&self) -> Result<(), RpcError> {
        let mut errors = FieldErrors::new();
        for (field, value) in [("title", &self.title), ("content", &self.content)] {
            if let Some(message) = length_violation(value) {
                errors.entry(field.to_string()).or_default().push(message);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RpcError::validation(errors))
        }
    }
}

fn length_violation(value: &str) -> Option<String> {
    let chars = value.chars().count();
    if chars == 0 {
        Some("String must contain at least 1 character(s)".to_string())
    } else if chars > MAX_FIELD_CHARS {
        Some(format!(
            "String must contain at most {MAX_FIELD_CHARS} character(s)"
        ))
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn new_post(title: &str, content: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_valid_post() {
        assert!(new_post("Hello", "World").validate().is_ok());
        assert!(new_post(&"é".repeat(256), "x").validate().is_ok());
    }

    #[test]
    fn test_field_errors_are_collected() {
        let err = new_post("", &"x".repeat(257)).validate().unwrap_err();
        let fields = err.field_errors.unwrap();

        assert_eq!(
            fields["title"],
            vec!["String must contain at least 1 character(s)".to_string()]
        );
        assert_eq!(
            fields["content"],
            vec!["String must contain at most 256 character(s)".to_string()]
        );
    }

    #[test]
    fn test_post_serializes_camel_case() {
        let post = Post {
            id: Uuid::nil(),
            title: "t".into(),
            content: "c".into(),
            created_at: DateTime::UNIX_EPOCH,
            updated_at: None,
        };
        let json = serde_json::to_value(&post).unwrap();

        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").unwrap().is_null());
    }
}
