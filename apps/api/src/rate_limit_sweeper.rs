use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use wereport_application::RateLimitService;

/// Periodically drops rate limit windows that have ended.
pub fn spawn_rate_limit_sweeper(service: RateLimitService, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_seconds = interval.as_secs(),
            "rate limit sweeper started"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            sweep_once(&service).await;
        }
    })
}

async fn sweep_once(service: &RateLimitService) {
    match service.sweep().await {
        Ok(removed) => debug!(removed, "swept expired rate limit windows"),
        Err(error) => warn!(error = %error, "rate limit sweep failed"),
    }
}
