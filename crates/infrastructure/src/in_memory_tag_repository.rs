use async_trait::async_trait;
use tokio::sync::RwLock;
use wereport_application::TagRepository;
use wereport_core::{AppError, AppResult};
use wereport_domain::Tag;

/// In-memory tag repository.
#[derive(Debug, Default)]
pub struct InMemoryTagRepository {
    tags: RwLock<Vec<Tag>>,
}

impl InMemoryTagRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TagRepository for InMemoryTagRepository {
    async fn list_tags(&self) -> AppResult<Vec<Tag>> {
        let mut tags = self.tags.read().await.clone();
        tags.sort_by(|left, right| {
            right
                .usage_count
                .cmp(&left.usage_count)
                .then_with(|| left.name.cmp(&right.name))
        });
        Ok(tags)
    }

    async fn insert_tag(&self, tag: Tag) -> AppResult<Tag> {
        let mut tags = self.tags.write().await;
        if tags
            .iter()
            .any(|existing| existing.slug == tag.slug || existing.name == tag.name)
        {
            return Err(AppError::Conflict(format!(
                "tag '{}' already exists",
                tag.slug
            )));
        }

        tags.push(tag.clone());
        Ok(tag)
    }
}
