use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;
use wereport_application::{
    CommentRepository, IssueRepository, NotificationRepository, PrincipalRepository,
    ProfileRepository, TagRepository,
};
use wereport_core::AppResult;
use wereport_infrastructure::{
    InMemoryIssueRepository, InMemoryNotificationRepository, InMemoryPrincipalRepository,
    InMemoryProfileRepository, InMemoryTagRepository, PostgresIssueRepository,
    PostgresNotificationRepository, PostgresPrincipalRepository, PostgresProfileRepository,
    PostgresTagRepository,
};

use crate::dev_seed;

pub(super) struct RepositorySet {
    pub(super) issue_repository: Arc<dyn IssueRepository>,
    pub(super) comment_repository: Arc<dyn CommentRepository>,
    pub(super) tag_repository: Arc<dyn TagRepository>,
    pub(super) principal_repository: Arc<dyn PrincipalRepository>,
    pub(super) notification_repository: Arc<dyn NotificationRepository>,
    pub(super) profile_repository: Arc<dyn ProfileRepository>,
}

pub(super) fn build_postgres_repository_set(pool: &PgPool) -> RepositorySet {
    let issues = Arc::new(PostgresIssueRepository::new(pool.clone()));

    RepositorySet {
        issue_repository: issues.clone(),
        comment_repository: issues,
        tag_repository: Arc::new(PostgresTagRepository::new(pool.clone())),
        principal_repository: Arc::new(PostgresPrincipalRepository::new(pool.clone())),
        notification_repository: Arc::new(PostgresNotificationRepository::new(pool.clone())),
        profile_repository: Arc::new(PostgresProfileRepository::new(pool.clone())),
    }
}

pub(super) async fn build_in_memory_repository_set(
    dev_access_tokens: Option<&str>,
) -> AppResult<RepositorySet> {
    let issues = Arc::new(InMemoryIssueRepository::new());
    let principals = Arc::new(InMemoryPrincipalRepository::new());
    let profiles = Arc::new(InMemoryProfileRepository::new());

    if let Some(tokens) = dev_access_tokens {
        let registered =
            dev_seed::register_access_tokens(&principals, &profiles, tokens).await?;
        info!(registered, "registered development access tokens");
    }

    Ok(RepositorySet {
        issue_repository: issues.clone(),
        comment_repository: issues,
        tag_repository: Arc::new(InMemoryTagRepository::new()),
        principal_repository: principals,
        notification_repository: Arc::new(InMemoryNotificationRepository::new()),
        profile_repository: profiles,
    })
}
