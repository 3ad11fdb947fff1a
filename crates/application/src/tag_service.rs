//! Tag catalogue ports and application service.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use wereport_core::{AppError, AppResult, Principal};
use wereport_domain::{NewTag, NewTagInput, Tag};

use crate::{Clock, OperationClass, RateLimitService, Throttled};

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Repository port for tags.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Lists all tags, most used first.
    async fn list_tags(&self) -> AppResult<Vec<Tag>>;

    /// Inserts a tag; fails with `Conflict` when the slug is taken.
    async fn insert_tag(&self, tag: Tag) -> AppResult<Tag>;
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for the tag catalogue.
#[derive(Clone)]
pub struct TagService {
    repository: Arc<dyn TagRepository>,
    rate_limits: RateLimitService,
    clock: Arc<dyn Clock>,
}

impl TagService {
    /// Creates a new tag service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn TagRepository>,
        rate_limits: RateLimitService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            rate_limits,
            clock,
        }
    }

    /// Lists all tags.
    pub async fn list_tags(&self) -> AppResult<Vec<Tag>> {
        self.repository.list_tags().await
    }

    /// Creates a tag. Only administrators may do this.
    pub async fn create_tag(
        &self,
        actor: &Principal,
        input: NewTagInput,
    ) -> AppResult<Throttled<Tag>> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden(
                "only administrators can create tags".to_owned(),
            ));
        }

        let quota = self
            .rate_limits
            .enforce(OperationClass::CreateTag, actor.subject())
            .await?;

        let new_tag = NewTag::new(input)?;
        let now = self.clock.now();
        let tag = Tag {
            id: Uuid::new_v4(),
            name: new_tag.name().to_owned(),
            slug: new_tag.slug().to_owned(),
            description: new_tag.description().map(str::to_owned),
            color: new_tag.color().to_owned(),
            icon: new_tag.icon().map(str::to_owned),
            usage_count: 0,
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert_tag(tag).await?;
        Ok(Throttled {
            value: stored,
            quota,
        })
    }
}
