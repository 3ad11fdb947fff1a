use axum::Json;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::SecondsFormat;
use serde::Serialize;
use wereport_application::{RateLimitDecision, Throttled};

pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const X_RATELIMIT_RESET: &str = "x-ratelimit-reset";

/// JSON response carrying the caller's remaining quota in headers.
#[derive(Debug)]
pub struct WithQuota<T> {
    status: StatusCode,
    body: T,
    quota: RateLimitDecision,
}

impl<T> WithQuota<T> {
    pub fn ok(throttled: Throttled<T>) -> Self {
        Self {
            status: StatusCode::OK,
            body: throttled.value,
            quota: throttled.quota,
        }
    }

    pub fn created(throttled: Throttled<T>) -> Self {
        Self {
            status: StatusCode::CREATED,
            body: throttled.value,
            quota: throttled.quota,
        }
    }
}

impl WithQuota<()> {
    /// Empty `204 No Content` response.
    pub fn no_content(throttled: Throttled<()>) -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            body: (),
            quota: throttled.quota,
        }
    }
}

impl<T: Serialize> IntoResponse for WithQuota<T> {
    fn into_response(self) -> Response {
        let mut response = if self.status == StatusCode::NO_CONTENT {
            self.status.into_response()
        } else {
            (self.status, Json(self.body)).into_response()
        };
        insert_quota_headers(response.headers_mut(), &self.quota);
        response
    }
}

pub fn insert_quota_headers(headers: &mut HeaderMap, quota: &RateLimitDecision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(quota.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(quota.remaining));

    let reset_at = quota.reset_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    if let Ok(value) = HeaderValue::from_str(reset_at.as_str()) {
        headers.insert(X_RATELIMIT_RESET, value);
    }
}
