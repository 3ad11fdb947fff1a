use std::sync::Arc;

use wereport_application::{
    AdminService, IssueService, NotificationService, PrincipalRepository, ProfileService,
    RateLimitService, TagService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub issue_service: IssueService,
    pub tag_service: TagService,
    pub admin_service: AdminService,
    pub notification_service: NotificationService,
    pub profile_service: ProfileService,
    pub rate_limit_service: RateLimitService,
    pub principal_repository: Arc<dyn PrincipalRepository>,
    pub redis_client: Option<redis::Client>,
    pub trust_proxy_headers: bool,
}
