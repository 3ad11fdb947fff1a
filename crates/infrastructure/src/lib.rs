//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_issue_repository;
mod in_memory_notification_repository;
mod in_memory_principal_repository;
mod in_memory_profile_repository;
mod in_memory_rate_limit_store;
mod in_memory_tag_repository;
mod postgres_issue_repository;
mod postgres_notification_repository;
mod postgres_principal_repository;
mod postgres_profile_repository;
mod postgres_tag_repository;
mod redis_rate_limit_store;

pub use in_memory_issue_repository::InMemoryIssueRepository;
pub use in_memory_notification_repository::InMemoryNotificationRepository;
pub use in_memory_principal_repository::InMemoryPrincipalRepository;
pub use in_memory_profile_repository::InMemoryProfileRepository;
pub use in_memory_rate_limit_store::InMemoryRateLimitStore;
pub use in_memory_tag_repository::InMemoryTagRepository;
pub use postgres_issue_repository::PostgresIssueRepository;
pub use postgres_notification_repository::PostgresNotificationRepository;
pub use postgres_principal_repository::PostgresPrincipalRepository;
pub use postgres_profile_repository::PostgresProfileRepository;
pub use postgres_tag_repository::PostgresTagRepository;
pub use redis_rate_limit_store::RedisRateLimitStore;
