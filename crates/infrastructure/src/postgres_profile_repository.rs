use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use wereport_application::ProfileRepository;
use wereport_core::{AppError, AppResult};
use wereport_domain::Profile;

const PROFILE_COLUMNS: &str = "id, email, full_name, first_name, last_name, bio, location, \
     avatar_url, is_admin, updated_at";

/// PostgreSQL-backed profile repository.
#[derive(Clone)]
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: String,
    email: Option<String>,
    full_name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    avatar_url: Option<String>,
    is_admin: bool,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            first_name: row.first_name,
            last_name: row.last_name,
            bio: row.bio,
            location: row.location,
            avatar_url: row.avatar_url,
            is_admin: row.is_admin,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find_profile(&self, user_id: &str) -> AppResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM profiles
            WHERE id = $1
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Upstream(format!("failed to find profile '{user_id}': {error}"))
        })?;

        Ok(row.map(Profile::from))
    }

    async fn update_profile(&self, profile: &Profile) -> AppResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            UPDATE profiles
            SET first_name = $2,
                last_name = $3,
                bio = $4,
                location = $5,
                avatar_url = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(profile.id.as_str())
        .bind(profile.first_name.as_deref())
        .bind(profile.last_name.as_deref())
        .bind(profile.bio.as_deref())
        .bind(profile.location.as_deref())
        .bind(profile.avatar_url.as_deref())
        .bind(profile.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Upstream(format!("failed to update profile '{}': {error}", profile.id))
        })?;

        Ok(row.map(Profile::from))
    }
}
