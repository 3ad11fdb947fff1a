use serde::{Deserialize, Serialize};
use wereport_core::{AppError, AppResult};

use crate::{IssueId, IssueStatus};

/// Maximum number of issues moderated in one bulk request.
pub const BULK_MODERATION_MAX_ISSUES: usize = 50;

/// Maximum moderation reason length in characters.
pub const MODERATION_REASON_MAX_LENGTH: usize = 500;

/// Moderator decision applied to a batch of issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    /// Accept the issues and move them to in-progress.
    Approve,
    /// Reject the issues.
    Reject,
    /// Delete the issues.
    Delete,
}

impl ModerationAction {
    /// Returns the storage string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Delete => "delete",
        }
    }

    /// Parses a storage string into an action.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "delete" => Ok(Self::Delete),
            _ => Err(AppError::Validation(format!(
                "unknown moderation action '{value}'"
            ))),
        }
    }

    /// Returns the status the action assigns, or `None` for deletion.
    #[must_use]
    pub fn target_status(&self) -> Option<IssueStatus> {
        match self {
            Self::Approve => Some(IssueStatus::InProgress),
            Self::Reject => Some(IssueStatus::Rejected),
            Self::Delete => None,
        }
    }
}

/// Validated bulk moderation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkModeration {
    issue_ids: Vec<IssueId>,
    action: ModerationAction,
    reason: Option<String>,
}

impl BulkModeration {
    /// Validates a bulk moderation request.
    pub fn new(
        issue_ids: Vec<IssueId>,
        action: ModerationAction,
        reason: Option<String>,
    ) -> AppResult<Self> {
        if issue_ids.is_empty() {
            return Err(AppError::Validation(
                "at least one issue id is required".to_owned(),
            ));
        }

        if issue_ids.len() > BULK_MODERATION_MAX_ISSUES {
            return Err(AppError::Validation(format!(
                "at most {BULK_MODERATION_MAX_ISSUES} issues can be moderated at once"
            )));
        }

        let reason = reason
            .map(|reason| reason.trim().to_owned())
            .filter(|reason| !reason.is_empty());
        if reason
            .as_deref()
            .is_some_and(|reason| reason.chars().count() > MODERATION_REASON_MAX_LENGTH)
        {
            return Err(AppError::Validation(format!(
                "reason must not exceed {MODERATION_REASON_MAX_LENGTH} characters"
            )));
        }

        Ok(Self {
            issue_ids,
            action,
            reason,
        })
    }

    /// Returns the targeted issue identifiers.
    #[must_use]
    pub fn issue_ids(&self) -> &[IssueId] {
        &self.issue_ids
    }

    /// Returns the action.
    #[must_use]
    pub fn action(&self) -> ModerationAction {
        self.action
    }

    /// Returns the moderator's reason, if given.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}
