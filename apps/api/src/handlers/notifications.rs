use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use wereport_core::Principal;
use wereport_domain::{NewNotificationInput, Notification, NotificationId, NotificationUpdateInput};

use crate::dto::NotificationListQuery;
use crate::error::ApiResult;
use crate::quota::WithQuota;
use crate::state::AppState;

pub async fn list_notifications_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<NotificationListQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    let notifications = state
        .notification_service
        .list_notifications(&principal, query.user_id.as_deref(), query.unread)
        .await?;

    Ok(Json(notifications))
}

pub async fn create_notification_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<NewNotificationInput>,
) -> ApiResult<WithQuota<Notification>> {
    let notification = state
        .notification_service
        .create_notification(&principal, payload)
        .await?;

    Ok(WithQuota::created(notification))
}

pub async fn update_notification_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(notification_id): Path<String>,
    Json(payload): Json<NotificationUpdateInput>,
) -> ApiResult<WithQuota<Notification>> {
    let notification = state
        .notification_service
        .update_notification(
            &principal,
            NotificationId::parse(notification_id.as_str())?,
            payload,
        )
        .await?;

    Ok(WithQuota::ok(notification))
}

pub async fn delete_notification_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(notification_id): Path<String>,
) -> ApiResult<WithQuota<()>> {
    let deleted = state
        .notification_service
        .delete_notification(&principal, NotificationId::parse(notification_id.as_str())?)
        .await?;

    Ok(WithQuota::no_content(deleted))
}
