use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use wereport_core::{AppError, AppResult};

use crate::IssueId;

/// Maximum comment length in characters.
pub const COMMENT_MAX_LENGTH: usize = 1000;

/// Validated comment body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentContent(String);

impl CommentContent {
    /// Creates a validated comment body.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "comment cannot be empty".to_owned(),
            ));
        }

        if trimmed.chars().count() > COMMENT_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "comment must not exceed {COMMENT_MAX_LENGTH} characters"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the comment text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<CommentContent> for String {
    fn from(value: CommentContent) -> Self {
        value.0
    }
}

/// Stored comment on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    /// Comment identifier.
    pub id: Uuid,
    /// Issue the comment belongs to.
    pub issue_id: IssueId,
    /// Subject of the commenting user.
    pub user_id: String,
    /// Comment text.
    pub content: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}
