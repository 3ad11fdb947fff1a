use async_trait::async_trait;

use wereport_core::{AppResult, Principal};

/// Port for resolving the caller behind an access token.
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Returns the principal owning a live access token, or `None`.
    async fn find_by_access_token(&self, access_token: &str) -> AppResult<Option<Principal>>;

    /// Checks that the identity store is reachable.
    async fn ping(&self) -> AppResult<()>;
}
