use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use wereport_application::ProfileRepository;
use wereport_core::AppResult;
use wereport_domain::Profile;

/// In-memory profile directory keyed by subject.
#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<String, Profile>>,
}

impl InMemoryProfileRepository {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `profile`, replacing any profile with the same subject.
    pub async fn register(&self, profile: Profile) {
        self.profiles
            .write()
            .await
            .insert(profile.id.clone(), profile);
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_profile(&self, user_id: &str) -> AppResult<Option<Profile>> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn update_profile(&self, profile: &Profile) -> AppResult<Option<Profile>> {
        let mut profiles = self.profiles.write().await;
        Ok(profiles.get_mut(&profile.id).map(|stored| {
            stored.first_name.clone_from(&profile.first_name);
            stored.last_name.clone_from(&profile.last_name);
            stored.bio.clone_from(&profile.bio);
            stored.location.clone_from(&profile.location);
            stored.avatar_url.clone_from(&profile.avatar_url);
            stored.updated_at = profile.updated_at;
            stored.clone()
        }))
    }
}
