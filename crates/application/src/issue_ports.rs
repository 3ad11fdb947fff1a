use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use wereport_core::AppResult;
use wereport_domain::{Comment, Issue, IssueId, IssueSearch, IssueStatus, PageRequest, Pagination};

/// One page of issues plus the total row count of the query.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuePage {
    /// Issues on this page.
    pub issues: Vec<Issue>,
    /// Rows matching the query across all pages.
    pub total: u64,
}

/// Issues returned to clients with pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueListing {
    /// Issues on this page.
    pub issues: Vec<Issue>,
    /// Pagination metadata.
    pub pagination: Pagination,
}

/// Result of adding or removing an upvote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpvoteOutcome {
    /// Whether the call changed the caller's upvote.
    pub changed: bool,
    /// Issue upvote count after the call.
    pub upvotes: u32,
}

/// Repository port for issues, upvotes and moderation writes.
#[async_trait]
pub trait IssueRepository: Send + Sync {
    /// Inserts a new issue and returns the stored row.
    async fn insert_issue(&self, issue: Issue) -> AppResult<Issue>;

    /// Finds one issue.
    async fn find_issue(&self, issue_id: IssueId) -> AppResult<Option<Issue>>;

    /// Lists issues newest first.
    async fn list_issues(&self, page: PageRequest) -> AppResult<IssuePage>;

    /// Runs a filtered, sorted and paginated search.
    async fn search_issues(&self, search: &IssueSearch) -> AppResult<IssuePage>;

    /// Lists issues in `status`, most upvoted first.
    async fn list_issues_by_status(&self, status: IssueStatus, limit: u32)
    -> AppResult<Vec<Issue>>;

    /// Lists the most upvoted issues regardless of status.
    async fn list_most_upvoted(&self, limit: u32) -> AppResult<Vec<Issue>>;

    /// Records an upvote by `user_id`; repeated upvotes are ignored.
    ///
    /// Fails with `NotFound` when the issue does not exist.
    async fn add_upvote(&self, issue_id: IssueId, user_id: &str) -> AppResult<UpvoteOutcome>;

    /// Removes an upvote by `user_id`; removing a missing upvote is ignored.
    ///
    /// Fails with `NotFound` when the issue does not exist.
    async fn remove_upvote(&self, issue_id: IssueId, user_id: &str) -> AppResult<UpvoteOutcome>;

    /// Sets the status of every listed issue and returns the affected row count.
    async fn update_status(
        &self,
        issue_ids: &[IssueId],
        status: IssueStatus,
        updated_at: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Deletes every listed issue and returns the affected row count.
    async fn delete_issues(&self, issue_ids: &[IssueId]) -> AppResult<u64>;

    /// Overwrites the editable columns of an existing issue.
    ///
    /// Returns `None` when the issue no longer exists.
    async fn update_issue(&self, issue: &Issue) -> AppResult<Option<Issue>>;

    /// Counts issues per status. Statuses without issues may be omitted.
    async fn count_by_status(&self) -> AppResult<Vec<(IssueStatus, u64)>>;
}

/// Repository port for issue comments.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Inserts a comment.
    ///
    /// Fails with `NotFound` when the issue does not exist.
    async fn insert_comment(&self, comment: Comment) -> AppResult<Comment>;

    /// Lists comments on an issue, newest first.
    async fn list_comments(&self, issue_id: IssueId, limit: u32) -> AppResult<Vec<Comment>>;
}
