//! Moderation views and bulk moderation for administrators.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use wereport_core::{AppError, AppResult, Principal};
use wereport_domain::{
    BulkModeration, Issue, IssueId, IssueStats, IssueStatus, ModerationAction, PrioritizedIssue,
    rank_by_priority,
};

use crate::{Clock, IssueRepository, OperationClass, RateLimitService, Throttled};

/// Rows returned by the moderation queue.
pub const MODERATION_QUEUE_LIMIT: u32 = 50;

/// Issues considered when ranking by priority.
pub const PRIORITY_CANDIDATE_LIMIT: u32 = 100;

/// Raw bulk moderation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BulkModerationInput {
    /// Issue identifiers as UUID strings.
    pub issue_ids: Vec<String>,
    /// `approve`, `reject` or `delete`.
    pub action: String,
    /// Optional moderator note.
    pub reason: Option<String>,
}

/// Result of a bulk moderation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkModerationOutcome {
    /// Applied action.
    pub action: ModerationAction,
    /// Rows changed or deleted.
    pub affected: u64,
}

/// Application service for administrator workflows.
#[derive(Clone)]
pub struct AdminService {
    issues: Arc<dyn IssueRepository>,
    rate_limits: RateLimitService,
    clock: Arc<dyn Clock>,
}

impl AdminService {
    /// Creates a new admin service.
    #[must_use]
    pub fn new(
        issues: Arc<dyn IssueRepository>,
        rate_limits: RateLimitService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            issues,
            rate_limits,
            clock,
        }
    }

    /// Lists issues awaiting moderation, most upvoted first.
    ///
    /// `status` defaults to `pending`.
    pub async fn moderation_queue(
        &self,
        actor: &Principal,
        status: Option<&str>,
    ) -> AppResult<Throttled<Vec<Issue>>> {
        require_admin(actor)?;
        let quota = self
            .rate_limits
            .enforce(OperationClass::Admin, actor.subject())
            .await?;

        let status = match status.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => IssueStatus::parse(value)?,
            None => IssueStatus::Pending,
        };
        let issues = self
            .issues
            .list_issues_by_status(status, MODERATION_QUEUE_LIMIT)
            .await?;

        Ok(Throttled {
            value: issues,
            quota,
        })
    }

    /// Ranks the most upvoted issues by priority score.
    pub async fn priority_ranking(
        &self,
        actor: &Principal,
    ) -> AppResult<Throttled<Vec<PrioritizedIssue>>> {
        require_admin(actor)?;
        let quota = self
            .rate_limits
            .enforce(OperationClass::Admin, actor.subject())
            .await?;

        let candidates = self
            .issues
            .list_most_upvoted(PRIORITY_CANDIDATE_LIMIT)
            .await?;

        Ok(Throttled {
            value: rank_by_priority(candidates),
            quota,
        })
    }

    /// Summarises issue counts per status and the resolution rate.
    pub async fn issue_stats(&self, actor: &Principal) -> AppResult<Throttled<IssueStats>> {
        require_admin(actor)?;
        let quota = self
            .rate_limits
            .enforce(OperationClass::Admin, actor.subject())
            .await?;

        let counts = self.issues.count_by_status().await?;
        Ok(Throttled {
            value: counts,
            quota,
        }
        .map(|counts| IssueStats::from_counts(&counts)))
    }

    /// Approves, rejects or deletes a batch of issues.
    pub async fn bulk_moderate(
        &self,
        actor: &Principal,
        input: BulkModerationInput,
    ) -> AppResult<Throttled<BulkModerationOutcome>> {
        require_admin(actor)?;
        let quota = self
            .rate_limits
            .enforce(OperationClass::BulkModeration, actor.subject())
            .await?;

        let issue_ids = input
            .issue_ids
            .iter()
            .map(|value| IssueId::parse(value))
            .collect::<AppResult<Vec<_>>>()?;
        let action = ModerationAction::parse(input.action.trim())?;
        let request = BulkModeration::new(issue_ids, action, input.reason)?;

        let affected = match request.action().target_status() {
            Some(status) => {
                self.issues
                    .update_status(request.issue_ids(), status, self.clock.now())
                    .await?
            }
            None => self.issues.delete_issues(request.issue_ids()).await?,
        };

        Ok(Throttled {
            value: BulkModerationOutcome { action, affected },
            quota,
        })
    }
}

fn require_admin(actor: &Principal) -> AppResult<()> {
    if actor.is_admin() {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "subject '{}' is not an administrator",
        actor.subject()
    )))
}
