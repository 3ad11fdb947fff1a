//! Issue reporting, search, upvotes and comments.

use std::sync::Arc;

use uuid::Uuid;

use wereport_core::{AppError, AppResult, Principal};
use wereport_domain::{
    Comment, CommentContent, Issue, IssueId, IssueSearch, IssueSearchInput, IssueUpdate,
    IssueUpdateInput, NewIssue, NewIssueInput, PageRequest,
};

use crate::{
    Clock, CommentRepository, IssueListing, IssueRepository, OperationClass, RateLimitService,
    Throttled, UpvoteOutcome,
};

/// Maximum comments returned for one issue.
pub const COMMENT_LIST_LIMIT: u32 = 100;

/// Application service for citizen-facing issue operations.
#[derive(Clone)]
pub struct IssueService {
    issues: Arc<dyn IssueRepository>,
    comments: Arc<dyn CommentRepository>,
    rate_limits: RateLimitService,
    clock: Arc<dyn Clock>,
}

impl IssueService {
    /// Creates a new issue service.
    #[must_use]
    pub fn new(
        issues: Arc<dyn IssueRepository>,
        comments: Arc<dyn CommentRepository>,
        rate_limits: RateLimitService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            issues,
            comments,
            rate_limits,
            clock,
        }
    }

    /// Lists issues newest first.
    pub async fn list_issues(&self, page: PageRequest) -> AppResult<IssueListing> {
        let result = self.issues.list_issues(page).await?;
        Ok(IssueListing {
            pagination: page.paginate(result.total),
            issues: result.issues,
        })
    }

    /// Fetches one issue.
    pub async fn get_issue(&self, issue_id: IssueId) -> AppResult<Issue> {
        self.issues
            .find_issue(issue_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("issue '{issue_id}' does not exist")))
    }

    /// Searches issues on behalf of an unauthenticated client.
    ///
    /// The limiter is keyed by `client_address`.
    pub async fn search_issues(
        &self,
        client_address: &str,
        input: IssueSearchInput,
    ) -> AppResult<Throttled<IssueListing>> {
        let quota = self
            .rate_limits
            .enforce(OperationClass::Search, client_address)
            .await?;

        let search = IssueSearch::new(input)?;
        let result = self.issues.search_issues(&search).await?;

        Ok(Throttled {
            value: IssueListing {
                pagination: search.page().paginate(result.total),
                issues: result.issues,
            },
            quota,
        })
    }

    /// Reports a new issue.
    ///
    /// Submissions carrying image URLs also draw from the image upload quota.
    /// That check runs after the create-issue check, so a submission refused
    /// for images has still spent its create-issue slot.
    pub async fn create_issue(
        &self,
        actor: &Principal,
        input: NewIssueInput,
    ) -> AppResult<Throttled<Issue>> {
        let quota = self
            .rate_limits
            .enforce(OperationClass::CreateIssue, actor.subject())
            .await?;

        let new_issue = NewIssue::new(input)?;
        if !new_issue.image_urls().is_empty() {
            self.rate_limits
                .enforce(OperationClass::ImageUpload, actor.subject())
                .await?;
        }

        let issue = Issue::open(IssueId::new(), actor.subject(), new_issue, self.clock.now());
        let stored = self.issues.insert_issue(issue).await?;

        Ok(Throttled {
            value: stored,
            quota,
        })
    }

    /// Edits an issue. Reporters may change its content; status and assigned
    /// authority are reserved for administrators.
    pub async fn update_issue(
        &self,
        actor: &Principal,
        issue_id: IssueId,
        input: IssueUpdateInput,
    ) -> AppResult<Throttled<Issue>> {
        let quota = self
            .rate_limits
            .enforce(OperationClass::IssueEdit, actor.subject())
            .await?;

        let mut issue = self.get_issue(issue_id).await?;
        require_owner_or_admin(actor, &issue, "edit")?;

        let update = IssueUpdate::new(input)?;
        if update.changes_moderation() && !actor.is_admin() {
            return Err(AppError::Forbidden(
                "only administrators can change status or assigned authority".to_owned(),
            ));
        }

        update.apply(&mut issue, self.clock.now());
        let stored = self
            .issues
            .update_issue(&issue)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("issue '{issue_id}' does not exist")))?;

        Ok(Throttled {
            value: stored,
            quota,
        })
    }

    /// Deletes an issue owned by the actor, or any issue for administrators.
    pub async fn delete_issue(
        &self,
        actor: &Principal,
        issue_id: IssueId,
    ) -> AppResult<Throttled<()>> {
        let quota = self
            .rate_limits
            .enforce(OperationClass::IssueEdit, actor.subject())
            .await?;

        let issue = self.get_issue(issue_id).await?;
        require_owner_or_admin(actor, &issue, "delete")?;

        if self.issues.delete_issues(&[issue_id]).await? == 0 {
            return Err(AppError::NotFound(format!(
                "issue '{issue_id}' does not exist"
            )));
        }

        Ok(Throttled { value: (), quota })
    }

    /// Upvotes an issue as the acting user.
    pub async fn upvote_issue(
        &self,
        actor: &Principal,
        issue_id: IssueId,
    ) -> AppResult<Throttled<UpvoteOutcome>> {
        let quota = self
            .rate_limits
            .enforce(OperationClass::Upvote, actor.subject())
            .await?;

        let outcome = self.issues.add_upvote(issue_id, actor.subject()).await?;
        Ok(Throttled {
            value: outcome,
            quota,
        })
    }

    /// Withdraws the acting user's upvote.
    ///
    /// Shares the upvote quota with [`IssueService::upvote_issue`].
    pub async fn remove_upvote(
        &self,
        actor: &Principal,
        issue_id: IssueId,
    ) -> AppResult<Throttled<UpvoteOutcome>> {
        let quota = self
            .rate_limits
            .enforce(OperationClass::Upvote, actor.subject())
            .await?;

        let outcome = self.issues.remove_upvote(issue_id, actor.subject()).await?;
        Ok(Throttled {
            value: outcome,
            quota,
        })
    }

    /// Lists the newest comments on an issue.
    pub async fn list_comments(&self, issue_id: IssueId) -> AppResult<Vec<Comment>> {
        self.comments
            .list_comments(issue_id, COMMENT_LIST_LIMIT)
            .await
    }

    /// Posts a comment as the acting user.
    pub async fn add_comment(
        &self,
        actor: &Principal,
        issue_id: IssueId,
        content: String,
    ) -> AppResult<Throttled<Comment>> {
        let quota = self
            .rate_limits
            .enforce(OperationClass::Comment, actor.subject())
            .await?;

        let content = CommentContent::new(content)?;
        let comment = Comment {
            id: Uuid::new_v4(),
            issue_id,
            user_id: actor.subject().to_owned(),
            content: content.into(),
            created_at: self.clock.now(),
        };

        let stored = self.comments.insert_comment(comment).await?;
        Ok(Throttled {
            value: stored,
            quota,
        })
    }
}

fn require_owner_or_admin(actor: &Principal, issue: &Issue, action: &str) -> AppResult<()> {
    if actor.is_admin() || issue.user_id == actor.subject() {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "you can only {action} your own issues"
    )))
}
