use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use wereport_application::PrincipalRepository;
use wereport_core::{AppError, AppResult, Principal};

/// Resolves bearer tokens against the identity provider's session table.
#[derive(Clone)]
pub struct PostgresPrincipalRepository {
    pool: PgPool,
}

impl PostgresPrincipalRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PrincipalRow {
    id: String,
    email: Option<String>,
    is_admin: bool,
}

#[async_trait]
impl PrincipalRepository for PostgresPrincipalRepository {
    async fn find_by_access_token(&self, access_token: &str) -> AppResult<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT profiles.id, profiles.email, profiles.is_admin
            FROM access_sessions
            INNER JOIN profiles ON profiles.id = access_sessions.user_id
            WHERE access_sessions.access_token = $1
              AND access_sessions.expires_at > now()
            "#,
        )
        .bind(access_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Upstream(format!("failed to resolve access token: {error}")))?;

        Ok(row.map(|row| Principal::new(row.id, row.email, row.is_admin)))
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, String>("SELECT id FROM profiles LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Upstream(format!("profiles table unreachable: {error}")))?;

        Ok(())
    }
}
