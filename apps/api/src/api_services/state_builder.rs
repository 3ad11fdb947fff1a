use std::sync::Arc;

use sqlx::PgPool;
use wereport_application::{
    AdminService, Clock, IssueService, NotificationService, ProfileService, SystemClock,
    TagService,
};
use wereport_core::{AppError, AppResult};

use crate::api_config::{ApiConfig, DataStoreConfig};
use crate::state::AppState;

use super::redis::build_redis_client;

mod rate_limits;
mod repositories;

pub async fn build_app_state(pool: Option<PgPool>, config: &ApiConfig) -> AppResult<AppState> {
    let redis_client = config
        .redis_url
        .as_deref()
        .map(build_redis_client)
        .transpose()?;

    let repositories = match (config.data_store, pool) {
        (DataStoreConfig::Postgres, Some(pool)) => {
            repositories::build_postgres_repository_set(&pool)
        }
        (DataStoreConfig::Postgres, None) => {
            return Err(AppError::Internal(
                "postgres data store selected without a connection pool".to_owned(),
            ));
        }
        (DataStoreConfig::Memory, _) => {
            repositories::build_in_memory_repository_set(config.dev_access_tokens.as_deref())
                .await?
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let rate_limit_service =
        rate_limits::build_rate_limit_service(config, redis_client.clone(), clock.clone())?;

    Ok(AppState {
        issue_service: IssueService::new(
            repositories.issue_repository.clone(),
            repositories.comment_repository,
            rate_limit_service.clone(),
            clock.clone(),
        ),
        tag_service: TagService::new(
            repositories.tag_repository,
            rate_limit_service.clone(),
            clock.clone(),
        ),
        admin_service: AdminService::new(
            repositories.issue_repository,
            rate_limit_service.clone(),
            clock.clone(),
        ),
        notification_service: NotificationService::new(
            repositories.notification_repository,
            rate_limit_service.clone(),
            clock.clone(),
        ),
        profile_service: ProfileService::new(
            repositories.profile_repository,
            rate_limit_service.clone(),
            clock,
        ),
        rate_limit_service,
        principal_repository: repositories.principal_repository,
        redis_client,
        trust_proxy_headers: config.trust_proxy_headers,
    })
}
