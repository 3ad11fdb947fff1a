use std::sync::Arc;

use chrono::Duration;

use wereport_core::AppError;

use crate::test_support::{FakeRateLimitStore, ManualClock, start_time};

use super::{OperationClass, RateLimitDecision, RateLimitRule, RateLimitService};

fn service(store: Arc<FakeRateLimitStore>, clock: Arc<ManualClock>) -> RateLimitService {
    RateLimitService::new(store, clock)
}

#[test]
fn rule_rejects_zero_limit_and_zero_window() {
    assert!(RateLimitRule::new(0, 60_000).is_err());
    assert!(RateLimitRule::new(10, 0).is_err());
    assert!(RateLimitRule::new(3, 60_000).is_ok());
}

#[test]
fn presets_match_operation_classes() {
    assert_eq!(OperationClass::CreateIssue.rule(), RateLimitRule::STRICT);
    assert_eq!(OperationClass::ImageUpload.rule().max_requests(), 5);
    assert_eq!(OperationClass::Search.rule(), RateLimitRule::DEFAULT);
    assert_eq!(RateLimitRule::DEFAULT.max_requests(), 100);
    assert_eq!(RateLimitRule::STRICT.window_ms(), 60_000);
}

#[test]
fn identifiers_carry_the_operation_class() {
    assert_eq!(
        OperationClass::CreateIssue.identifier("user-42"),
        "create-issue:user-42"
    );
    assert_eq!(
        OperationClass::BulkModeration.identifier("admin-1"),
        "bulk-moderation:admin-1"
    );
    assert_eq!(
        OperationClass::Search.identifier("anonymous"),
        "search:anonymous"
    );
    assert_eq!(
        OperationClass::IssueEdit.identifier("user-42"),
        "issue-edit:user-42"
    );
    assert_eq!(
        OperationClass::Notification.identifier("user-42"),
        "notification:user-42"
    );
    assert_eq!(OperationClass::Profile.identifier("user-42"), "profile:user-42");
    assert_eq!(OperationClass::Profile.rule(), RateLimitRule::DEFAULT);
}

#[test]
fn retry_after_rounds_up_and_never_drops_below_one_second() {
    let decision = RateLimitDecision {
        allowed: false,
        remaining: 0,
        limit: 10,
        reset_at: start_time() + Duration::milliseconds(1_500),
    };

    assert_eq!(decision.retry_after_seconds(start_time()), 2);
    assert_eq!(
        decision.retry_after_seconds(start_time() + Duration::seconds(5)),
        1
    );
}

#[tokio::test]
async fn blank_identifier_is_rejected_before_reaching_the_store() {
    let store = Arc::new(FakeRateLimitStore::default());
    let clock = Arc::new(ManualClock::new(start_time()));
    let service = service(store.clone(), clock);

    let result = service.check_rate_limit("  ", RateLimitRule::DEFAULT).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(store.seen_keys().is_empty());
}

#[tokio::test]
async fn check_reports_denial_as_a_value() {
    let store = Arc::new(FakeRateLimitStore::default());
    let clock = Arc::new(ManualClock::new(start_time()));
    let service = service(store, clock);
    let rule = RateLimitRule::new(1, 60_000).unwrap_or_else(|_| panic!("test"));

    let first = service.check_rate_limit("comment:user-1", rule).await;
    let second = service.check_rate_limit("comment:user-1", rule).await;

    assert!(first.is_ok_and(|decision| decision.allowed));
    assert!(second.is_ok_and(|decision| !decision.allowed && decision.remaining == 0));
}

#[tokio::test]
async fn keys_include_limit_and_window() {
    let store = Arc::new(FakeRateLimitStore::default());
    let clock = Arc::new(ManualClock::new(start_time()));
    let service = service(store.clone(), clock);

    let _ = service
        .check_rate_limit("create-issue:user-42", RateLimitRule::STRICT)
        .await;
    let _ = service
        .check_rate_limit("create-issue:user-42", RateLimitRule::DEFAULT)
        .await;

    assert_eq!(
        store.seen_keys(),
        vec![
            "create-issue:user-42:10:60000".to_owned(),
            "create-issue:user-42:100:60000".to_owned(),
        ]
    );
}

#[tokio::test]
async fn enforce_turns_exhausted_window_into_rate_limited_error() {
    let store = Arc::new(FakeRateLimitStore::default());
    let clock = Arc::new(ManualClock::new(start_time()));
    let service = service(store, clock.clone());

    for _ in 0..10 {
        assert!(
            service
                .enforce(OperationClass::CreateIssue, "user-42")
                .await
                .is_ok()
        );
    }

    clock.advance(Duration::seconds(15));
    let result = service.enforce(OperationClass::CreateIssue, "user-42").await;

    match result {
        Err(AppError::RateLimited(denial)) => {
            assert_eq!(denial.limit, 10);
            assert_eq!(denial.reset_at, start_time() + Duration::seconds(60));
            assert_eq!(denial.retry_after_seconds, 45);
        }
        other => panic!("expected rate limited error, got {other:?}"),
    }
}

#[tokio::test]
async fn store_failures_propagate() {
    let store = Arc::new(FakeRateLimitStore::failing());
    let clock = Arc::new(ManualClock::new(start_time()));
    let service = service(store, clock);

    let result = service.enforce(OperationClass::Comment, "user-1").await;

    assert!(matches!(result, Err(AppError::Upstream(_))));
}

#[tokio::test]
async fn sweep_uses_the_injected_clock() {
    let store = Arc::new(FakeRateLimitStore::default());
    let clock = Arc::new(ManualClock::new(start_time()));
    let service = service(store, clock.clone());

    let _ = service.enforce(OperationClass::Upvote, "user-1").await;
    assert_eq!(service.sweep().await.unwrap_or_default(), 0);

    clock.advance(Duration::seconds(60));
    assert_eq!(service.sweep().await.unwrap_or_default(), 1);
}
