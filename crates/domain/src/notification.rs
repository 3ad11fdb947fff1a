use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use wereport_core::{AppError, AppResult, NonEmptyString};

use crate::parse_http_url;

/// Maximum notification title length in characters.
pub const NOTIFICATION_TITLE_MAX_LENGTH: usize = 200;

/// Maximum notification message length in characters.
pub const NOTIFICATION_MESSAGE_MAX_LENGTH: usize = 1000;

/// Unique identifier for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    /// Creates a new random notification identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a notification identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a notification identifier from its textual UUID form.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| AppError::Validation(format!("invalid notification id '{value}'")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// An issue the user follows changed.
    IssueUpdate,
    /// Someone commented.
    Comment,
    /// Someone upvoted.
    Upvote,
    /// An issue moved through moderation.
    StatusChange,
    /// Platform announcement.
    System,
}

impl NotificationKind {
    /// Returns the storage string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IssueUpdate => "issue_update",
            Self::Comment => "comment",
            Self::Upvote => "upvote",
            Self::StatusChange => "status_change",
            Self::System => "system",
        }
    }

    /// Parses a storage string.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "issue_update" => Ok(Self::IssueUpdate),
            "comment" => Ok(Self::Comment),
            "upvote" => Ok(Self::Upvote),
            "status_change" => Ok(Self::StatusChange),
            "system" => Ok(Self::System),
            _ => Err(AppError::Validation(format!(
                "unknown notification type '{value}'"
            ))),
        }
    }
}

/// Raw notification as submitted by an administrator.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewNotificationInput {
    /// Recipient subject.
    pub user_id: String,
    /// Notification type storage string.
    #[serde(rename = "type")]
    pub kind: String,
    /// Headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Optional link target.
    pub link: Option<String>,
    /// Free-form JSON object.
    pub metadata: Option<Map<String, Value>>,
}

/// Validated notification ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    user_id: NonEmptyString,
    kind: NotificationKind,
    title: String,
    message: String,
    link: Option<String>,
    metadata: Option<Map<String, Value>>,
}

impl NewNotification {
    /// Validates a raw notification.
    pub fn new(input: NewNotificationInput) -> AppResult<Self> {
        let user_id = NonEmptyString::new(input.user_id.trim())
            .map_err(|_| AppError::Validation("notification recipient is required".to_owned()))?;
        let kind = NotificationKind::parse(input.kind.trim())?;
        let title = required_text("title", input.title, NOTIFICATION_TITLE_MAX_LENGTH)?;
        let message = required_text("message", input.message, NOTIFICATION_MESSAGE_MAX_LENGTH)?;
        let link = input
            .link
            .map(|link| parse_http_url("link", &link).map(String::from))
            .transpose()?;

        Ok(Self {
            user_id,
            kind,
            title,
            message,
            link,
            metadata: input.metadata,
        })
    }

    /// Returns the recipient subject.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.user_id.as_str()
    }
}

fn required_text(field: &str, value: String, max: usize) -> AppResult<String> {
    let value = value.trim().to_owned();
    let length = value.chars().count();
    if length == 0 || length > max {
        return Err(AppError::Validation(format!(
            "notification {field} must be between 1 and {max} characters"
        )));
    }

    Ok(value)
}

/// Partial notification edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct NotificationUpdateInput {
    /// New read flag.
    pub read: Option<bool>,
}

/// Stored notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Notification identifier.
    pub id: NotificationId,
    /// Recipient subject.
    pub user_id: String,
    /// Notification type.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Optional link target.
    pub link: Option<String>,
    /// Free-form JSON object.
    pub metadata: Option<Map<String, Value>>,
    /// Whether the recipient has read it.
    pub read: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Builds the stored form of a new, unread notification.
    #[must_use]
    pub fn create(id: NotificationId, new: NewNotification, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id.into(),
            kind: new.kind,
            title: new.title,
            message: new.message,
            link: new.link,
            metadata: new.metadata,
            read: false,
            created_at: now,
        }
    }
}
