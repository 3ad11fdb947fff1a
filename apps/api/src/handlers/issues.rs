use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use wereport_application::{IssueListing, UpvoteOutcome};
use wereport_core::Principal;
use wereport_domain::{
    Issue, IssueId, IssueSearchInput, IssueUpdateInput, NewIssueInput, PageRequest,
};

use crate::dto::IssueListQuery;
use crate::error::ApiResult;
use crate::middleware::ClientAddress;
use crate::quota::WithQuota;
use crate::state::AppState;

pub async fn list_issues_handler(
    State(state): State<AppState>,
    Query(query): Query<IssueListQuery>,
) -> ApiResult<Json<IssueListing>> {
    let listing = state
        .issue_service
        .list_issues(PageRequest::new(query.limit, query.offset))
        .await?;

    Ok(Json(listing))
}

pub async fn get_issue_handler(
    State(state): State<AppState>,
    Path(issue_id): Path<String>,
) -> ApiResult<Json<Issue>> {
    let issue = state
        .issue_service
        .get_issue(IssueId::parse(issue_id.as_str())?)
        .await?;

    Ok(Json(issue))
}

pub async fn create_issue_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<NewIssueInput>,
) -> ApiResult<WithQuota<Issue>> {
    let issue = state
        .issue_service
        .create_issue(&principal, payload)
        .await?;

    Ok(WithQuota::created(issue))
}

pub async fn update_issue_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(issue_id): Path<String>,
    Json(payload): Json<IssueUpdateInput>,
) -> ApiResult<WithQuota<Issue>> {
    let issue = state
        .issue_service
        .update_issue(&principal, IssueId::parse(issue_id.as_str())?, payload)
        .await?;

    Ok(WithQuota::ok(issue))
}

pub async fn delete_issue_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(issue_id): Path<String>,
) -> ApiResult<WithQuota<()>> {
    let deleted = state
        .issue_service
        .delete_issue(&principal, IssueId::parse(issue_id.as_str())?)
        .await?;

    Ok(WithQuota::no_content(deleted))
}

pub async fn search_issues_handler(
    State(state): State<AppState>,
    Extension(ClientAddress(client_address)): Extension<ClientAddress>,
    Query(query): Query<IssueSearchInput>,
) -> ApiResult<WithQuota<IssueListing>> {
    let listing = state
        .issue_service
        .search_issues(client_address.as_str(), query)
        .await?;

    Ok(WithQuota::ok(listing))
}

pub async fn upvote_issue_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(issue_id): Path<String>,
) -> ApiResult<WithQuota<UpvoteOutcome>> {
    let outcome = state
        .issue_service
        .upvote_issue(&principal, IssueId::parse(issue_id.as_str())?)
        .await?;

    Ok(WithQuota::ok(outcome))
}

pub async fn remove_upvote_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(issue_id): Path<String>,
) -> ApiResult<WithQuota<UpvoteOutcome>> {
    let outcome = state
        .issue_service
        .remove_upvote(&principal, IssueId::parse(issue_id.as_str())?)
        .await?;

    Ok(WithQuota::ok(outcome))
}
