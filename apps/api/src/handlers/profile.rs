use axum::Json;
use axum::extract::{Extension, State};
use wereport_core::Principal;
use wereport_domain::{Profile, ProfileUpdateInput};

use crate::error::ApiResult;
use crate::quota::WithQuota;
use crate::state::AppState;

pub async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<ProfileUpdateInput>,
) -> ApiResult<WithQuota<Profile>> {
    let profile = state
        .profile_service
        .update_profile(&principal, payload)
        .await?;

    Ok(WithQuota::ok(profile))
}
