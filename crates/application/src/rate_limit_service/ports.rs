use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use wereport_core::{AppError, AppResult, RateLimitDenial};

use super::config::RateLimitRule;

/// Store key for one limiter bucket.
///
/// Two rules with different limits or windows never share a bucket, even for
/// the same identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    identifier: String,
    rule: RateLimitRule,
}

impl RateLimitKey {
    /// Creates a key, rejecting blank identifiers.
    pub fn new(identifier: impl Into<String>, rule: RateLimitRule) -> AppResult<Self> {
        let identifier = identifier.into();
        if identifier.trim().is_empty() {
            return Err(AppError::Validation(
                "rate limit identifier must not be empty".to_owned(),
            ));
        }

        Ok(Self { identifier, rule })
    }

    /// Returns the rule the bucket is counted against.
    #[must_use]
    pub fn rule(&self) -> RateLimitRule {
        self.rule
    }
}

impl Display for RateLimitKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}:{}:{}",
            self.identifier,
            self.rule.max_requests(),
            self.rule.window_ms()
        )
    }
}

/// Outcome of one limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    /// Whether the operation may proceed.
    pub allowed: bool,
    /// Operations left in the current window.
    pub remaining: u32,
    /// Window capacity.
    pub limit: u32,
    /// End of the current window.
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Whole seconds from `now` until the window resets, at least one.
    #[must_use]
    pub fn retry_after_seconds(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset_at - now).num_milliseconds();
        let seconds = u64::try_from(millis.max(0)).unwrap_or(0).div_ceil(1000);
        seconds.max(1)
    }

    /// Converts a denial into the error payload returned to callers.
    #[must_use]
    pub fn denial(&self, now: DateTime<Utc>) -> RateLimitDenial {
        RateLimitDenial {
            limit: self.limit,
            reset_at: self.reset_at,
            retry_after_seconds: self.retry_after_seconds(now),
        }
    }
}

/// Storage port for fixed-window counters.
///
/// Implementations perform the read-check-write for a key atomically.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Counts one operation against `key` at `now` and reports the decision.
    ///
    /// Opens a fresh window when none exists or the current one has ended.
    /// A denied operation leaves the stored count untouched.
    async fn hit(&self, key: &RateLimitKey, now: DateTime<Utc>) -> AppResult<RateLimitDecision>;

    /// Removes every bucket whose window ended at or before `now`.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
