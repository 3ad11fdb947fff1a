//! Profile ports and application service.

use std::sync::Arc;

use async_trait::async_trait;

use wereport_core::{AppError, AppResult, Principal};
use wereport_domain::{Profile, ProfileUpdate, ProfileUpdateInput};

use crate::{Clock, OperationClass, RateLimitService, Throttled};

/// Repository port for user profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Finds a profile by subject.
    async fn find_profile(&self, user_id: &str) -> AppResult<Option<Profile>>;

    /// Overwrites the editable fields. Returns `None` when the profile is gone.
    async fn update_profile(&self, profile: &Profile) -> AppResult<Option<Profile>>;
}

/// Application service for profile edits.
#[derive(Clone)]
pub struct ProfileService {
    repository: Arc<dyn ProfileRepository>,
    rate_limits: RateLimitService,
    clock: Arc<dyn Clock>,
}

impl ProfileService {
    /// Creates a new profile service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn ProfileRepository>,
        rate_limits: RateLimitService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            rate_limits,
            clock,
        }
    }

    /// Edits the actor's profile, or any profile for administrators.
    pub async fn update_profile(
        &self,
        actor: &Principal,
        input: ProfileUpdateInput,
    ) -> AppResult<Throttled<Profile>> {
        let target = input
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(actor.subject())
            .to_owned();
        if target != actor.subject() && !actor.is_admin() {
            return Err(AppError::Forbidden(
                "you can only update your own profile".to_owned(),
            ));
        }

        let quota = self
            .rate_limits
            .enforce(OperationClass::Profile, actor.subject())
            .await?;

        let update = ProfileUpdate::new(input)?;
        let missing = || AppError::NotFound(format!("profile '{target}' does not exist"));
        let mut profile = self
            .repository
            .find_profile(&target)
            .await?
            .ok_or_else(missing)?;

        update.apply(&mut profile, self.clock.now());
        let stored = self
            .repository
            .update_profile(&profile)
            .await?
            .ok_or_else(missing)?;

        Ok(Throttled {
            value: stored,
            quota,
        })
    }
}
