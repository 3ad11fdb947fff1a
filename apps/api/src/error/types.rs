use chrono::{DateTime, Utc};
use serde::Serialize;

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reset_at: Option<DateTime<Utc>>,
}

impl ErrorResponse {
    pub(super) fn new(message: String) -> Self {
        Self {
            message,
            reset_at: None,
        }
    }

    pub(super) fn rate_limited(message: String, reset_at: DateTime<Utc>) -> Self {
        Self {
            message,
            reset_at: Some(reset_at),
        }
    }
}
