use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use wereport_application::TagRepository;
use wereport_core::{AppError, AppResult};
use wereport_domain::Tag;

/// PostgreSQL-backed tag repository.
#[derive(Clone)]
pub struct PostgresTagRepository {
    pool: PgPool,
}

impl PostgresTagRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TagRow {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    color: String,
    icon: Option<String>,
    usage_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            color: row.color,
            icon: row.icon,
            usage_count: u32::try_from(row.usage_count).unwrap_or(0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    async fn list_tags(&self) -> AppResult<Vec<Tag>> {
        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT id, name, slug, description, color, icon, usage_count, created_at, updated_at
            FROM tags
            ORDER BY usage_count DESC, name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Upstream(format!("failed to list tags: {error}")))?;

        Ok(rows.into_iter().map(Tag::from).collect())
    }

    async fn insert_tag(&self, tag: Tag) -> AppResult<Tag> {
        let row = sqlx::query_as::<_, TagRow>(
            r#"
            INSERT INTO tags (
                id, name, slug, description, color, icon, usage_count, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, name, slug, description, color, icon, usage_count, created_at, updated_at
            "#,
        )
        .bind(tag.id)
        .bind(tag.name.as_str())
        .bind(tag.slug.as_str())
        .bind(tag.description.as_deref())
        .bind(tag.color.as_str())
        .bind(tag.icon.as_deref())
        .bind(i32::try_from(tag.usage_count).unwrap_or(i32::MAX))
        .bind(tag.created_at)
        .bind(tag.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            if error
                .as_database_error()
                .is_some_and(|database_error| database_error.is_unique_violation())
            {
                return AppError::Conflict(format!(
                    "tag '{}' or slug '{}' already exists",
                    tag.name, tag.slug
                ));
            }
            AppError::Upstream(format!("failed to insert tag: {error}"))
        })?;

        Ok(Tag::from(row))
    }
}
