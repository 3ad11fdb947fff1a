use axum::Json;
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};
use wereport_core::AppError;

mod types;

pub use types::ErrorResponse;

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let AppError::RateLimited(denial) = &self.0 {
            debug!(
                limit = denial.limit,
                retry_after_seconds = denial.retry_after_seconds,
                "request rate limited"
            );

            let payload = Json(ErrorResponse::rate_limited(
                self.0.to_string(),
                denial.reset_at,
            ));
            let mut response = (StatusCode::TOO_MANY_REQUESTS, payload).into_response();
            response.headers_mut().insert(
                RETRY_AFTER,
                HeaderValue::from(denial.retry_after_seconds),
            );
            return response;
        }

        let status = match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let payload = Json(ErrorResponse::new(self.0.to_string()));

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::http::header::RETRY_AFTER;
    use axum::response::IntoResponse;
    use chrono::{DateTime, TimeZone, Utc};
    use wereport_core::{AppError, RateLimitDenial};

    use super::ApiError;

    #[tokio::test]
    async fn rate_limited_error_maps_to_429_with_retry_after() {
        let reset_at = Utc
            .timestamp_opt(1_700_000_045, 0)
            .single()
            .unwrap_or_default();
        let response = ApiError(AppError::RateLimited(RateLimitDenial {
            limit: 10,
            reset_at,
            retry_after_seconds: 45,
        }))
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok()),
            Some("45")
        );

        let body = to_bytes(response.into_body(), usize::MAX).await;
        let Ok(body) = body else {
            panic!("failed to read body");
        };
        let payload: serde_json::Value =
            serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        let echoed_reset = payload["reset_at"]
            .as_str()
            .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
            .map(|value| value.with_timezone(&Utc));
        assert_eq!(echoed_reset, Some(reset_at));
        assert!(payload["message"].as_str().is_some_and(|message| message.contains("45")));
    }

    #[test]
    fn upstream_failure_is_a_server_error_not_a_throttle() {
        let response =
            ApiError(AppError::Upstream("database unreachable".to_owned())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(RETRY_AFTER).is_none());
    }

    #[test]
    fn client_errors_keep_their_status() {
        let cases = [
            (AppError::Validation("bad".to_owned()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("gone".to_owned()), StatusCode::NOT_FOUND),
            (AppError::Conflict("taken".to_owned()), StatusCode::CONFLICT),
            (AppError::Unauthorized("who".to_owned()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("no".to_owned()), StatusCode::FORBIDDEN),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError(error).into_response().status(), status);
        }
    }
}
