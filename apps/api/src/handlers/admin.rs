use axum::Json;
use axum::extract::{Extension, Query, State};
use wereport_application::{BulkModerationInput, BulkModerationOutcome};
use wereport_core::Principal;
use wereport_domain::{Issue, IssueStats, PrioritizedIssue};

use crate::dto::ModerationQueueQuery;
use crate::error::ApiResult;
use crate::quota::WithQuota;
use crate::state::AppState;

pub async fn moderation_queue_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ModerationQueueQuery>,
) -> ApiResult<WithQuota<Vec<Issue>>> {
    let issues = state
        .admin_service
        .moderation_queue(&principal, query.status.as_deref())
        .await?;

    Ok(WithQuota::ok(issues))
}

pub async fn priority_ranking_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<WithQuota<Vec<PrioritizedIssue>>> {
    let ranked = state.admin_service.priority_ranking(&principal).await?;
    Ok(WithQuota::ok(ranked))
}

pub async fn bulk_moderation_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<BulkModerationInput>,
) -> ApiResult<WithQuota<BulkModerationOutcome>> {
    let outcome = state
        .admin_service
        .bulk_moderate(&principal, payload)
        .await?;

    Ok(WithQuota::ok(outcome))
}

pub async fn issue_stats_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<WithQuota<IssueStats>> {
    let stats = state.admin_service.issue_stats(&principal).await?;
    Ok(WithQuota::ok(stats))
}
