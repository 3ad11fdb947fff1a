use chrono::Duration;
use serde::Serialize;

use wereport_core::{AppError, AppResult};

/// Longest accepted window, one year in milliseconds.
const MAX_WINDOW_MS: u64 = 365 * 24 * 60 * 60 * 1000;

/// Fixed-window limit: at most `max_requests` operations per `window_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RateLimitRule {
    max_requests: u32,
    window_ms: u64,
}

impl RateLimitRule {
    /// 100 operations per minute, for general authenticated traffic.
    pub const DEFAULT: Self = Self {
        max_requests: 100,
        window_ms: 60_000,
    };

    /// 10 operations per minute, for issue creation.
    pub const STRICT: Self = Self {
        max_requests: 10,
        window_ms: 60_000,
    };

    /// 5 operations per minute, for submissions that attach images.
    pub const IMAGE_UPLOAD: Self = Self {
        max_requests: 5,
        window_ms: 60_000,
    };

    /// Creates a rule, rejecting a zero limit or an empty or oversized window.
    pub fn new(max_requests: u32, window_ms: u64) -> AppResult<Self> {
        if max_requests == 0 {
            return Err(AppError::Validation(
                "rate limit max_requests must be positive".to_owned(),
            ));
        }

        if window_ms == 0 || window_ms > MAX_WINDOW_MS {
            return Err(AppError::Validation(format!(
                "rate limit window must be between 1 and {MAX_WINDOW_MS} milliseconds"
            )));
        }

        Ok(Self {
            max_requests,
            window_ms,
        })
    }

    /// Returns the maximum operations allowed per window.
    #[must_use]
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Returns the window length in milliseconds.
    #[must_use]
    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Returns the window length as a duration.
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::milliseconds(i64::try_from(self.window_ms).unwrap_or(i64::MAX / 1000))
    }
}

/// Throttled operation kinds and the rule each one uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationClass {
    /// Reporting a new issue.
    CreateIssue,
    /// Attaching images to a submission.
    ImageUpload,
    /// Posting a comment.
    Comment,
    /// Adding or removing an upvote.
    Upvote,
    /// Creating a tag.
    CreateTag,
    /// Reading moderation views.
    Admin,
    /// Moderating issues in bulk.
    BulkModeration,
    /// Public issue search, keyed by client address.
    Search,
    /// Editing or deleting an existing issue.
    IssueEdit,
    /// Creating, updating or deleting notifications.
    Notification,
    /// Editing a profile.
    Profile,
}

impl OperationClass {
    /// Returns the identifier prefix.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateIssue => "create-issue",
            Self::ImageUpload => "image-upload",
            Self::Comment => "comment",
            Self::Upvote => "upvote",
            Self::CreateTag => "create-tag",
            Self::Admin => "admin",
            Self::BulkModeration => "bulk-moderation",
            Self::Search => "search",
            Self::IssueEdit => "issue-edit",
            Self::Notification => "notification",
            Self::Profile => "profile",
        }
    }

    /// Returns the rule applied to this operation class.
    #[must_use]
    pub fn rule(&self) -> RateLimitRule {
        match self {
            Self::CreateIssue => RateLimitRule::STRICT,
            Self::ImageUpload => RateLimitRule::IMAGE_UPLOAD,
            Self::Comment
            | Self::Upvote
            | Self::CreateTag
            | Self::Admin
            | Self::BulkModeration
            | Self::Search
            | Self::IssueEdit
            | Self::Notification
            | Self::Profile => RateLimitRule::DEFAULT,
        }
    }

    /// Builds the limiter identifier `"{class}:{subject}"`.
    #[must_use]
    pub fn identifier(&self, subject: &str) -> String {
        format!("{}:{subject}", self.as_str())
    }
}
