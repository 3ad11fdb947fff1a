use serde::{Deserialize, Serialize};

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub data_store: HealthDependencyStatus,
    pub redis: HealthDependencyStatus,
}

/// One runtime dependency health status.
#[derive(Debug, Serialize)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

/// Offset pagination for the public issue feed.
#[derive(Debug, Default, Deserialize)]
pub struct IssueListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Incoming payload for a new comment.
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

/// Status filter for the moderation queue.
#[derive(Debug, Default, Deserialize)]
pub struct ModerationQueueQuery {
    pub status: Option<String>,
}

/// Filters for a notification listing.
#[derive(Debug, Default, Deserialize)]
pub struct NotificationListQuery {
    #[serde(alias = "userId")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub unread: bool,
}
