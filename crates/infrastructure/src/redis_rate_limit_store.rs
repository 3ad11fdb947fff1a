//! Redis-backed fixed-window rate limit store.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use redis::Script;
use wereport_application::{RateLimitDecision, RateLimitKey, RateLimitStore};
use wereport_core::{AppError, AppResult};

const HIT_SCRIPT: &str = r#"
local key = KEYS[1]
local max_requests = tonumber(ARGV[1])
local window_ms = tonumber(ARGV[2])
local now_ms = tonumber(ARGV[3])

local count = tonumber(redis.call('HGET', key, 'count'))
local reset_at = tonumber(redis.call('HGET', key, 'reset_at'))

if count == nil or reset_at == nil or now_ms >= reset_at then
  reset_at = now_ms + window_ms
  redis.call('HSET', key, 'count', 1, 'reset_at', reset_at)
  redis.call('PEXPIREAT', key, reset_at)
  return {1, max_requests - 1, reset_at}
end

if count >= max_requests then
  return {0, 0, reset_at}
end

count = redis.call('HINCRBY', key, 'count', 1)
return {1, max_requests - count, reset_at}
"#;

/// Redis implementation of the rate limit store port.
///
/// Buckets are shared by every process pointed at the same Redis, and expire
/// on their own once the window ends.
#[derive(Clone)]
pub struct RedisRateLimitStore {
    client: redis::Client,
    key_prefix: String,
}

impl RedisRateLimitStore {
    /// Creates a store with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, key: &RateLimitKey) -> String {
        format!("{}:{key}", self.key_prefix)
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn hit(&self, key: &RateLimitKey, now: DateTime<Utc>) -> AppResult<RateLimitDecision> {
        let rule = key.rule();
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Upstream(format!("failed to connect to redis: {error}")))?;

        let (allowed, remaining, reset_at_ms): (i64, i64, i64) = Script::new(HIT_SCRIPT)
            .key(self.key_for(key))
            .arg(rule.max_requests())
            .arg(rule.window_ms())
            .arg(now.timestamp_millis())
            .invoke_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Upstream(format!("failed to record redis rate limit hit: {error}"))
            })?;

        let remaining = u32::try_from(remaining)
            .map_err(|error| AppError::Internal(format!("invalid redis remaining count: {error}")))?;
        let reset_at = Utc
            .timestamp_millis_opt(reset_at_ms)
            .single()
            .ok_or_else(|| {
                AppError::Internal(format!("invalid redis window reset timestamp: {reset_at_ms}"))
            })?;

        Ok(RateLimitDecision {
            allowed: allowed == 1,
            remaining,
            limit: rule.max_requests(),
            reset_at,
        })
    }

    async fn sweep_expired(&self, _now: DateTime<Utc>) -> AppResult<u64> {
        // Keys expire at the end of their window via PEXPIREAT.
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;
    use wereport_application::{RateLimitKey, RateLimitRule, RateLimitStore};

    use super::RedisRateLimitStore;

    fn test_store() -> Option<RedisRateLimitStore> {
        let Ok(redis_url) = std::env::var("REDIS_URL") else {
            return None;
        };

        let client = match redis::Client::open(redis_url) {
            Ok(client) => client,
            Err(error) => panic!("invalid REDIS_URL in test: {error}"),
        };

        Some(RedisRateLimitStore::new(
            client,
            format!("wereport-test:{}", Uuid::new_v4()),
        ))
    }

    #[tokio::test]
    async fn redis_store_denies_after_limit_and_resets_with_window() {
        let Some(store) = test_store() else {
            return;
        };
        let rule = RateLimitRule::new(2, 60_000).unwrap_or_else(|_| panic!("test"));
        let key = RateLimitKey::new("create-issue:user-42", rule).unwrap_or_else(|_| panic!("test"));
        let now = Utc::now();

        let first = store.hit(&key, now).await;
        let second = store.hit(&key, now).await;
        let third = store.hit(&key, now).await;
        let next_window = store.hit(&key, now + Duration::seconds(60)).await;

        assert!(first.is_ok_and(|decision| decision.allowed && decision.remaining == 1));
        assert!(second.is_ok_and(|decision| decision.allowed && decision.remaining == 0));
        assert!(third.is_ok_and(|decision| !decision.allowed && decision.remaining == 0));
        assert!(next_window.is_ok_and(|decision| decision.allowed && decision.remaining == 1));
    }
}
