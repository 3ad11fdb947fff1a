use axum::Json;
use axum::extract::{Extension, State};
use wereport_core::Principal;
use wereport_domain::{NewTagInput, Tag};

use crate::error::ApiResult;
use crate::quota::WithQuota;
use crate::state::AppState;

pub async fn list_tags_handler(State(state): State<AppState>) -> ApiResult<Json<Vec<Tag>>> {
    Ok(Json(state.tag_service.list_tags().await?))
}

pub async fn create_tag_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<NewTagInput>,
) -> ApiResult<WithQuota<Tag>> {
    let tag = state.tag_service.create_tag(&principal, payload).await?;
    Ok(WithQuota::created(tag))
}
