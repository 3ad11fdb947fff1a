//! Process-local fixed-window rate limit store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use wereport_application::{RateLimitDecision, RateLimitKey, RateLimitStore};
use wereport_core::{AppError, AppResult};

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// In-memory implementation of the rate limit store port.
///
/// Counters live for the lifetime of the process and are not shared between
/// instances. Each check runs inside one lock acquisition, so concurrent
/// checks on the same key never lose an increment.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    windows: Mutex<HashMap<RateLimitKey, WindowEntry>>,
}

impl InMemoryRateLimitStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of tracked buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.windows
            .lock()
            .map(|windows| windows.len())
            .unwrap_or_default()
    }

    /// Returns whether no buckets are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, key: &RateLimitKey, now: DateTime<Utc>) -> AppResult<RateLimitDecision> {
        let rule = key.rule();
        let limit = rule.max_requests();
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| AppError::Internal("rate limit store lock poisoned".to_owned()))?;

        let entry = windows.entry(key.clone()).or_insert(WindowEntry {
            count: 0,
            reset_at: now,
        });

        if now >= entry.reset_at {
            *entry = WindowEntry {
                count: 0,
                reset_at: now + rule.window(),
            };
        }

        if entry.count >= limit {
            return Ok(RateLimitDecision {
                allowed: false,
                remaining: 0,
                limit,
                reset_at: entry.reset_at,
            });
        }

        entry.count += 1;
        Ok(RateLimitDecision {
            allowed: true,
            remaining: limit - entry.count,
            limit,
            reset_at: entry.reset_at,
        })
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn hit(&self, key: &RateLimitKey, now: DateTime<Utc>) -> AppResult<RateLimitDecision> {
        self.record(key, now)
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| AppError::Internal("rate limit store lock poisoned".to_owned()))?;

        let before = windows.len();
        windows.retain(|_, entry| entry.reset_at > now);
        let removed = before - windows.len();

        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}
