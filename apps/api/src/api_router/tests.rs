use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use serde_json::{Value, json};
use tower::ServiceExt;
use wereport_application::PrincipalRepository;
use wereport_core::{AppError, AppResult, Principal};

use crate::api_config::{ApiConfig, DataStoreConfig, RateLimitStoreConfig};
use crate::api_services::build_app_state;
use crate::quota::{X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING};
use crate::state::AppState;

use super::build_router;

const CITIZEN_TOKEN: &str = "citizen-token";
const ADMIN_TOKEN: &str = "admin-token";
const NEIGHBOUR_TOKEN: &str = "neighbour-token";

fn memory_config() -> ApiConfig {
    ApiConfig {
        migrate_only: false,
        data_store: DataStoreConfig::Memory,
        database_url: None,
        frontend_url: "http://localhost:3000".to_owned(),
        api_host: "127.0.0.1".to_owned(),
        api_port: 0,
        rate_limit_store: RateLimitStoreConfig::Memory,
        redis_url: None,
        rate_limit_sweep_interval: Duration::from_secs(300),
        trust_proxy_headers: true,
        dev_access_tokens: Some(format!(
            "{CITIZEN_TOKEN}=alice, {ADMIN_TOKEN}=root:admin, {NEIGHBOUR_TOKEN}=bob"
        )),
    }
}

async fn memory_state() -> AppState {
    match build_app_state(None, &memory_config()).await {
        Ok(state) => state,
        Err(error) => panic!("failed to build in-memory state: {error}"),
    }
}

fn router(state: AppState) -> Router {
    match build_router(state, "http://localhost:3000") {
        Ok(router) => router,
        Err(error) => panic!("failed to build router: {error}"),
    }
}

async fn send(router: &Router, request: Request<Body>) -> Response {
    match router.clone().oneshot(request).await {
        Ok(response) => response,
        Err(error) => match error {},
    }
}

async fn json_body(response: Response) -> Value {
    let Ok(bytes) = to_bytes(response.into_body(), usize::MAX).await else {
        panic!("failed to read response body");
    };
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }

    let body = match body {
        Some(body) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    match builder.body(body) {
        Ok(request) => request,
        Err(error) => panic!("invalid test request: {error}"),
    }
}

fn issue_payload(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Reported by a resident",
        "category": "infrastructure",
        "location": "Main Street",
    })
}

async fn create_issue(router: &Router, token: &str, title: &str) -> String {
    let created = send(
        router,
        request(Method::POST, "/api/issues", Some(token), Some(issue_payload(title))),
    )
    .await;
    json_body(created).await["id"]
        .as_str()
        .map(ToOwned::to_owned)
        .unwrap_or_default()
}

fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}

#[tokio::test]
async fn health_reports_ok_for_memory_store() {
    let router = router(memory_state().await);
    let response = send(&router, request(Method::GET, "/health", None, None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["redis"]["status"], "disabled");
}

struct UnreachablePrincipals;

#[async_trait]
impl PrincipalRepository for UnreachablePrincipals {
    async fn find_by_access_token(&self, _access_token: &str) -> AppResult<Option<Principal>> {
        Err(AppError::Upstream("identity store offline".to_owned()))
    }

    async fn ping(&self) -> AppResult<()> {
        Err(AppError::Upstream("identity store offline".to_owned()))
    }
}

#[tokio::test]
async fn health_is_degraded_when_data_store_fails() {
    let mut state = memory_state().await;
    state.principal_repository = Arc::new(UnreachablePrincipals);
    let router = router(state);

    let response = send(&router, request(Method::GET, "/health", None, None)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["status"], "degraded");
}

#[tokio::test]
async fn creating_issue_requires_a_known_token() {
    let router = router(memory_state().await);

    let anonymous = send(
        &router,
        request(Method::POST, "/api/issues", None, Some(issue_payload("Pothole"))),
    )
    .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let unknown = send(
        &router,
        request(
            Method::POST,
            "/api/issues",
            Some("forged"),
            Some(issue_payload("Pothole")),
        ),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn eleventh_issue_in_a_minute_is_throttled_without_insert() {
    let router = router(memory_state().await);

    for attempt in 0..10 {
        let response = send(
            &router,
            request(
                Method::POST,
                "/api/issues",
                Some(CITIZEN_TOKEN),
                Some(issue_payload(&format!("Broken light {attempt}"))),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(header(&response, X_RATELIMIT_LIMIT), Some("10"));
        let expected_remaining = (9 - attempt).to_string();
        assert_eq!(
            header(&response, X_RATELIMIT_REMAINING),
            Some(expected_remaining.as_str())
        );
    }

    let throttled = send(
        &router,
        request(
            Method::POST,
            "/api/issues",
            Some(CITIZEN_TOKEN),
            Some(issue_payload("One too many")),
        ),
    )
    .await;
    assert_eq!(throttled.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after = header(&throttled, RETRY_AFTER.as_str())
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(0);
    assert!((1..=60).contains(&retry_after));
    assert!(json_body(throttled).await["reset_at"].is_string());

    let listing = send(&router, request(Method::GET, "/api/issues", None, None)).await;
    assert_eq!(json_body(listing).await["pagination"]["total"], 10);
}

#[tokio::test]
async fn search_buckets_are_keyed_by_forwarded_address() {
    let router = router(memory_state().await);
    let search = |address: &str| {
        let mut request = request(Method::GET, "/api/issues/search?search=light", None, None);
        if let Ok(value) = address.parse() {
            request.headers_mut().insert("x-forwarded-for", value);
        }
        request
    };

    for _ in 0..100 {
        let response = send(&router, search("203.0.113.7")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let denied = send(&router, search("203.0.113.7")).await;
    assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);

    let other_client = send(&router, search("198.51.100.2")).await;
    assert_eq!(other_client.status(), StatusCode::OK);
    assert_eq!(header(&other_client, X_RATELIMIT_REMAINING), Some("99"));
}

#[tokio::test]
async fn bulk_moderation_is_reserved_for_administrators() {
    let router = router(memory_state().await);

    let created = send(
        &router,
        request(
            Method::POST,
            "/api/issues",
            Some(CITIZEN_TOKEN),
            Some(issue_payload("Overflowing bin")),
        ),
    )
    .await;
    let issue_id = json_body(created).await["id"]
        .as_str()
        .map(ToOwned::to_owned)
        .unwrap_or_default();
    let payload = json!({ "issue_ids": [issue_id], "action": "approve" });

    let citizen = send(
        &router,
        request(
            Method::POST,
            "/api/admin/bulk",
            Some(CITIZEN_TOKEN),
            Some(payload.clone()),
        ),
    )
    .await;
    assert_eq!(citizen.status(), StatusCode::FORBIDDEN);

    let admin = send(
        &router,
        request(Method::POST, "/api/admin/bulk", Some(ADMIN_TOKEN), Some(payload)),
    )
    .await;
    assert_eq!(admin.status(), StatusCode::OK);
    assert_eq!(json_body(admin).await["affected"], 1);

    let fetched = send(
        &router,
        request(Method::GET, &format!("/api/issues/{issue_id}"), None, None),
    )
    .await;
    assert_eq!(json_body(fetched).await["status"], "in-progress");
}

#[tokio::test]
async fn comment_and_upvote_round_trip() {
    let router = router(memory_state().await);

    let created = send(
        &router,
        request(
            Method::POST,
            "/api/issues",
            Some(CITIZEN_TOKEN),
            Some(issue_payload("Cracked pavement")),
        ),
    )
    .await;
    let issue_id = json_body(created).await["id"]
        .as_str()
        .map(ToOwned::to_owned)
        .unwrap_or_default();

    let upvote_uri = format!("/api/issues/{issue_id}/upvote");
    let first = send(
        &router,
        request(Method::POST, &upvote_uri, Some(ADMIN_TOKEN), None),
    )
    .await;
    assert_eq!(json_body(first).await["upvotes"], 1);
    let repeated = send(
        &router,
        request(Method::POST, &upvote_uri, Some(ADMIN_TOKEN), None),
    )
    .await;
    let repeated = json_body(repeated).await;
    assert_eq!(repeated["changed"], false);
    assert_eq!(repeated["upvotes"], 1);

    let comments_uri = format!("/api/issues/{issue_id}/comments");
    let posted = send(
        &router,
        request(
            Method::POST,
            &comments_uri,
            Some(CITIZEN_TOKEN),
            Some(json!({ "content": "Still there this morning" })),
        ),
    )
    .await;
    assert_eq!(posted.status(), StatusCode::CREATED);

    let listed = send(&router, request(Method::GET, &comments_uri, None, None)).await;
    let listed = json_body(listed).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn owners_edit_and_delete_their_issues() {
    let router = router(memory_state().await);
    let issue_id = create_issue(&router, CITIZEN_TOKEN, "Flooded underpass").await;
    let issue_uri = format!("/api/issues/{issue_id}");
    let edit = json!({ "title": "Flooded underpass on 5th", "severity": 4 });

    let stranger = send(
        &router,
        request(Method::PUT, &issue_uri, Some(NEIGHBOUR_TOKEN), Some(edit.clone())),
    )
    .await;
    assert_eq!(stranger.status(), StatusCode::FORBIDDEN);

    let moderation = send(
        &router,
        request(
            Method::PUT,
            &issue_uri,
            Some(CITIZEN_TOKEN),
            Some(json!({ "status": "resolved" })),
        ),
    )
    .await;
    assert_eq!(moderation.status(), StatusCode::FORBIDDEN);

    let edited = send(
        &router,
        request(Method::PUT, &issue_uri, Some(CITIZEN_TOKEN), Some(edit)),
    )
    .await;
    assert_eq!(edited.status(), StatusCode::OK);
    assert_eq!(header(&edited, X_RATELIMIT_LIMIT), Some("100"));
    let edited = json_body(edited).await;
    assert_eq!(edited["title"], "Flooded underpass on 5th");
    assert_eq!(edited["severity"], 4);

    let denied = send(
        &router,
        request(Method::DELETE, &issue_uri, Some(NEIGHBOUR_TOKEN), None),
    )
    .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let deleted = send(
        &router,
        request(Method::DELETE, &issue_uri, Some(CITIZEN_TOKEN), None),
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let fetched = send(&router, request(Method::GET, &issue_uri, None, None)).await;
    assert_eq!(fetched.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn notifications_are_sent_by_admins_and_managed_by_recipients() {
    let router = router(memory_state().await);
    let payload = json!({
        "user_id": "alice",
        "type": "status_change",
        "title": "Report approved",
        "message": "Your pothole report is now in progress",
    });

    let forged = send(
        &router,
        request(
            Method::POST,
            "/api/notifications",
            Some(CITIZEN_TOKEN),
            Some(payload.clone()),
        ),
    )
    .await;
    assert_eq!(forged.status(), StatusCode::FORBIDDEN);

    let sent = send(
        &router,
        request(Method::POST, "/api/notifications", Some(ADMIN_TOKEN), Some(payload)),
    )
    .await;
    assert_eq!(sent.status(), StatusCode::CREATED);
    let notification_id = json_body(sent).await["id"]
        .as_str()
        .map(ToOwned::to_owned)
        .unwrap_or_default();

    let snooping = send(
        &router,
        request(
            Method::GET,
            "/api/notifications?userId=alice",
            Some(NEIGHBOUR_TOKEN),
            None,
        ),
    )
    .await;
    assert_eq!(snooping.status(), StatusCode::FORBIDDEN);

    let inbox = send(
        &router,
        request(Method::GET, "/api/notifications?unread=true", Some(CITIZEN_TOKEN), None),
    )
    .await;
    let inbox = json_body(inbox).await;
    assert_eq!(inbox.as_array().map(Vec::len), Some(1));
    assert_eq!(inbox[0]["type"], "status_change");

    let notification_uri = format!("/api/notifications/{notification_id}");
    let read = send(
        &router,
        request(
            Method::PATCH,
            &notification_uri,
            Some(CITIZEN_TOKEN),
            Some(json!({ "read": true })),
        ),
    )
    .await;
    assert_eq!(read.status(), StatusCode::OK);
    assert_eq!(json_body(read).await["read"], true);

    let unread = send(
        &router,
        request(Method::GET, "/api/notifications?unread=true", Some(CITIZEN_TOKEN), None),
    )
    .await;
    assert_eq!(json_body(unread).await.as_array().map(Vec::len), Some(0));

    let removed = send(
        &router,
        request(Method::DELETE, &notification_uri, Some(CITIZEN_TOKEN), None),
    )
    .await;
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);

    let malformed = send(
        &router,
        request(Method::DELETE, "/api/notifications/not-a-uuid", Some(CITIZEN_TOKEN), None),
    )
    .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_stats_count_issues_by_status() {
    let router = router(memory_state().await);
    let resolved = create_issue(&router, CITIZEN_TOKEN, "Streetlight out").await;
    let _pending = create_issue(&router, CITIZEN_TOKEN, "Loose manhole cover").await;

    let approved = send(
        &router,
        request(
            Method::PUT,
            &format!("/api/issues/{resolved}"),
            Some(ADMIN_TOKEN),
            Some(json!({ "status": "resolved" })),
        ),
    )
    .await;
    assert_eq!(approved.status(), StatusCode::OK);

    let citizen = send(
        &router,
        request(Method::GET, "/api/admin/stats", Some(CITIZEN_TOKEN), None),
    )
    .await;
    assert_eq!(citizen.status(), StatusCode::FORBIDDEN);

    let stats = send(
        &router,
        request(Method::GET, "/api/admin/stats", Some(ADMIN_TOKEN), None),
    )
    .await;
    assert_eq!(stats.status(), StatusCode::OK);
    let stats = json_body(stats).await;
    assert_eq!(stats["totalIssues"], 2);
    assert_eq!(stats["pendingIssues"], 1);
    assert_eq!(stats["resolvedIssues"], 1);
    assert_eq!(stats["resolutionRate"], 50);
}

#[tokio::test]
async fn profile_patch_edits_own_profile_only() {
    let router = router(memory_state().await);

    let updated = send(
        &router,
        request(
            Method::PATCH,
            "/api/profile",
            Some(CITIZEN_TOKEN),
            Some(json!({ "first_name": "Alice", "location": "Freetown" })),
        ),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = json_body(updated).await;
    assert_eq!(updated["id"], "alice");
    assert_eq!(updated["location"], "Freetown");

    let other = send(
        &router,
        request(
            Method::PATCH,
            "/api/profile",
            Some(CITIZEN_TOKEN),
            Some(json!({ "userId": "bob", "bio": "Not mine" })),
        ),
    )
    .await;
    assert_eq!(other.status(), StatusCode::FORBIDDEN);

    let bad_avatar = send(
        &router,
        request(
            Method::PATCH,
            "/api/profile",
            Some(CITIZEN_TOKEN),
            Some(json!({ "avatar_url": "http://:::::" })),
        ),
    )
    .await;
    assert_eq!(bad_avatar.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_accepts_camel_case_sort_parameter() {
    let router = router(memory_state().await);
    let quiet = create_issue(&router, CITIZEN_TOKEN, "Quiet corner bench").await;
    let popular = create_issue(&router, CITIZEN_TOKEN, "Popular corner bench").await;
    let upvoted = send(
        &router,
        request(
            Method::POST,
            &format!("/api/issues/{popular}/upvote"),
            Some(ADMIN_TOKEN),
            None,
        ),
    )
    .await;
    assert_eq!(upvoted.status(), StatusCode::OK);

    let response = send(
        &router,
        request(
            Method::GET,
            "/api/issues/search?search=corner&sortBy=upvotes",
            None,
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["issues"][0]["id"], popular.as_str());
    assert_eq!(body["issues"][1]["id"], quiet.as_str());
}
