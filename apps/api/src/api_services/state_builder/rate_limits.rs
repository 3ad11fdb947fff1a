use std::sync::Arc;

use wereport_application::{Clock, RateLimitService, RateLimitStore};
use wereport_core::{AppError, AppResult};
use wereport_infrastructure::{InMemoryRateLimitStore, RedisRateLimitStore};

use crate::api_config::{ApiConfig, RateLimitStoreConfig};

pub(super) fn build_rate_limit_service(
    config: &ApiConfig,
    redis_client: Option<redis::Client>,
    clock: Arc<dyn Clock>,
) -> AppResult<RateLimitService> {
    let store: Arc<dyn RateLimitStore> = match config.rate_limit_store {
        RateLimitStoreConfig::Memory => Arc::new(InMemoryRateLimitStore::new()),
        RateLimitStoreConfig::Redis => {
            let redis_client = redis_client.ok_or_else(|| {
                AppError::Validation("REDIS_URL is required when RATE_LIMIT_STORE=redis".to_owned())
            })?;
            Arc::new(RedisRateLimitStore::new(redis_client, "wereport:rate_limit"))
        }
    };

    Ok(RateLimitService::new(store, clock))
}
