use std::sync::Arc;

use wereport_core::{AppError, AppResult};

use super::config::{OperationClass, RateLimitRule};
use super::ports::{Clock, RateLimitDecision, RateLimitKey, RateLimitStore};

/// Result of a throttled operation together with the quota it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct Throttled<T> {
    /// Operation result.
    pub value: T,
    /// Limiter decision that admitted the operation.
    pub quota: RateLimitDecision,
}

impl<T> Throttled<T> {
    /// Transforms the value while keeping the quota.
    pub fn map<U>(self, transform: impl FnOnce(T) -> U) -> Throttled<U> {
        Throttled {
            value: transform(self.value),
            quota: self.quota,
        }
    }
}

/// Application service for fixed-window rate limiting.
#[derive(Clone)]
pub struct RateLimitService {
    store: Arc<dyn RateLimitStore>,
    clock: Arc<dyn Clock>,
}

impl RateLimitService {
    /// Creates a new rate limit service.
    #[must_use]
    pub fn new(store: Arc<dyn RateLimitStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Counts one operation for `identifier` under `rule`.
    ///
    /// A denial is returned as `allowed == false`, not as an error. Errors are
    /// limited to blank identifiers and store failures.
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        rule: RateLimitRule,
    ) -> AppResult<RateLimitDecision> {
        let key = RateLimitKey::new(identifier, rule)?;
        self.store.hit(&key, self.clock.now()).await
    }

    /// Counts one operation of `class` for `subject`, failing with
    /// [`AppError::RateLimited`] when the window is exhausted.
    pub async fn enforce(
        &self,
        class: OperationClass,
        subject: &str,
    ) -> AppResult<RateLimitDecision> {
        let decision = self
            .check_rate_limit(&class.identifier(subject), class.rule())
            .await?;

        if !decision.allowed {
            return Err(AppError::RateLimited(decision.denial(self.clock.now())));
        }

        Ok(decision)
    }

    /// Removes buckets whose window has ended.
    pub async fn sweep(&self) -> AppResult<u64> {
        self.store.sweep_expired(self.clock.now()).await
    }
}
