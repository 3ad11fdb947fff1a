use axum::Json;
use axum::extract::{Extension, Path, State};
use wereport_core::Principal;
use wereport_domain::{Comment, IssueId};

use crate::dto::CreateCommentRequest;
use crate::error::ApiResult;
use crate::quota::WithQuota;
use crate::state::AppState;

pub async fn list_comments_handler(
    State(state): State<AppState>,
    Path(issue_id): Path<String>,
) -> ApiResult<Json<Vec<Comment>>> {
    let comments = state
        .issue_service
        .list_comments(IssueId::parse(issue_id.as_str())?)
        .await?;

    Ok(Json(comments))
}

pub async fn create_comment_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(issue_id): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> ApiResult<WithQuota<Comment>> {
    let comment = state
        .issue_service
        .add_comment(
            &principal,
            IssueId::parse(issue_id.as_str())?,
            payload.content,
        )
        .await?;

    Ok(WithQuota::created(comment))
}
