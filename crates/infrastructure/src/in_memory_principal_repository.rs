use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use wereport_application::PrincipalRepository;
use wereport_core::{AppResult, Principal};

/// In-memory access token directory.
#[derive(Debug, Default)]
pub struct InMemoryPrincipalRepository {
    tokens: RwLock<HashMap<String, Principal>>,
}

impl InMemoryPrincipalRepository {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `principal` as the owner of `access_token`.
    pub async fn register(&self, access_token: impl Into<String>, principal: Principal) {
        self.tokens
            .write()
            .await
            .insert(access_token.into(), principal);
    }
}

#[async_trait]
impl PrincipalRepository for InMemoryPrincipalRepository {
    async fn find_by_access_token(&self, access_token: &str) -> AppResult<Option<Principal>> {
        Ok(self.tokens.read().await.get(access_token).cloned())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
