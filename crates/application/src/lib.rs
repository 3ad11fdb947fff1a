//! Application services and ports.

#![forbid(unsafe_code)]

mod admin_service;
mod issue_ports;
mod issue_service;
mod notification_service;
mod principal_ports;
mod profile_service;
mod rate_limit_service;
mod tag_service;

#[cfg(test)]
mod test_support;

pub use admin_service::{
    AdminService, BulkModerationInput, BulkModerationOutcome, MODERATION_QUEUE_LIMIT,
    PRIORITY_CANDIDATE_LIMIT,
};
pub use issue_ports::{CommentRepository, IssueListing, IssuePage, IssueRepository, UpvoteOutcome};
pub use issue_service::{COMMENT_LIST_LIMIT, IssueService};
pub use notification_service::{
    NOTIFICATION_LIST_LIMIT, NotificationRepository, NotificationService,
};
pub use principal_ports::PrincipalRepository;
pub use profile_service::{ProfileRepository, ProfileService};
pub use rate_limit_service::{
    Clock, OperationClass, RateLimitDecision, RateLimitKey, RateLimitRule, RateLimitService,
    RateLimitStore, SystemClock, Throttled,
};
pub use tag_service::{TagRepository, TagService};
