use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post, put};
use tower_http::trace::TraceLayer;
use wereport_core::AppError;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route("/api/issues", post(handlers::issues::create_issue_handler))
        .route(
            "/api/issues/{issue_id}",
            put(handlers::issues::update_issue_handler)
                .delete(handlers::issues::delete_issue_handler),
        )
        .route(
            "/api/issues/{issue_id}/upvote",
            post(handlers::issues::upvote_issue_handler),
        )
        .route(
            "/api/issues/{issue_id}/upvote/remove",
            post(handlers::issues::remove_upvote_handler),
        )
        .route(
            "/api/issues/{issue_id}/comments",
            post(handlers::comments::create_comment_handler),
        )
        .route("/api/tags", post(handlers::tags::create_tag_handler))
        .route(
            "/api/admin/issues",
            get(handlers::admin::moderation_queue_handler),
        )
        .route(
            "/api/admin/priority",
            get(handlers::admin::priority_ranking_handler),
        )
        .route(
            "/api/admin/bulk",
            post(handlers::admin::bulk_moderation_handler),
        )
        .route("/api/admin/stats", get(handlers::admin::issue_stats_handler))
        .route(
            "/api/notifications",
            get(handlers::notifications::list_notifications_handler)
                .post(handlers::notifications::create_notification_handler),
        )
        .route(
            "/api/notifications/{notification_id}",
            patch(handlers::notifications::update_notification_handler)
                .delete(handlers::notifications::delete_notification_handler),
        )
        .route(
            "/api/profile",
            patch(handlers::profile::update_profile_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    let search_routes = Router::new()
        .route(
            "/api/issues/search",
            get(handlers::issues::search_issues_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::resolve_client_address,
        ));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/api/issues", get(handlers::issues::list_issues_handler))
        .route(
            "/api/issues/{issue_id}",
            get(handlers::issues::get_issue_handler),
        )
        .route(
            "/api/issues/{issue_id}/comments",
            get(handlers::comments::list_comments_handler),
        )
        .route("/api/tags", get(handlers::tags::list_tags_handler))
        .merge(search_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .with_state(app_state))
}

#[cfg(test)]
mod tests;
