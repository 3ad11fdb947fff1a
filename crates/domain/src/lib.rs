//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod comment;
mod issue;
mod moderation;
mod notification;
mod priority;
mod profile;
mod search;
mod stats;
mod tag;
mod web_url;

pub use comment::{COMMENT_MAX_LENGTH, Comment, CommentContent};
pub use issue::{
    Coordinates, CoordinatesInput, ISSUE_AUTHORITY_MAX_LENGTH, ISSUE_DESCRIPTION_MAX_LENGTH,
    ISSUE_EDIT_DESCRIPTION_MIN_LENGTH, ISSUE_EDIT_TITLE_MIN_LENGTH, ISSUE_LOCATION_MIN_LENGTH,
    ISSUE_MAX_IMAGES, ISSUE_TITLE_MAX_LENGTH, Issue, IssueCategory, IssueId, IssueStatus,
    IssueUpdate, IssueUpdateInput, NewIssue, NewIssueInput, Severity,
};
pub use moderation::{
    BULK_MODERATION_MAX_ISSUES, BulkModeration, MODERATION_REASON_MAX_LENGTH, ModerationAction,
};
pub use notification::{
    NOTIFICATION_MESSAGE_MAX_LENGTH, NOTIFICATION_TITLE_MAX_LENGTH, NewNotification,
    NewNotificationInput, Notification, NotificationId, NotificationKind, NotificationUpdateInput,
};
pub use priority::{PrioritizedIssue, priority_score, rank_by_priority};
pub use profile::{
    PROFILE_BIO_MAX_LENGTH, PROFILE_LOCATION_MAX_LENGTH, PROFILE_NAME_MAX_LENGTH, Profile,
    ProfileUpdate, ProfileUpdateInput,
};
pub use search::{
    DEFAULT_PAGE_LIMIT, IssueSearch, IssueSearchInput, IssueSort, MAX_PAGE_LIMIT, PageRequest,
    Pagination, escape_like_pattern,
};
pub use stats::IssueStats;
pub use tag::{DEFAULT_TAG_COLOR, NewTag, NewTagInput, Tag};
pub use web_url::parse_http_url;
