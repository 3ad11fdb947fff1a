use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use wereport_application::NotificationRepository;
use wereport_core::{AppError, AppResult};
use wereport_domain::{Notification, NotificationId, NotificationKind};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, type, title, message, link, metadata, read, created_at";

/// PostgreSQL-backed notification repository.
#[derive(Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: String,
    #[sqlx(rename = "type")]
    kind: String,
    title: String,
    message: String,
    link: Option<String>,
    metadata: Option<Json<Map<String, Value>>>,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: NotificationId::from_uuid(row.id),
            user_id: row.user_id,
            kind: NotificationKind::parse(row.kind.as_str())?,
            title: row.title,
            message: row.message,
            link: row.link,
            metadata: row.metadata.map(|Json(metadata)| metadata),
            read: row.read,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u32,
    ) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE user_id = $1
              AND (NOT $2 OR read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3
            "#
        ))
        .bind(user_id)
        .bind(unread_only)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Upstream(format!("failed to list notifications: {error}")))?;

        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn find_notification(
        &self,
        notification_id: NotificationId,
    ) -> AppResult<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE id = $1
            "#
        ))
        .bind(notification_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Upstream(format!(
                "failed to find notification '{notification_id}': {error}"
            ))
        })?;

        row.map(Notification::try_from).transpose()
    }

    async fn insert_notification(&self, notification: Notification) -> AppResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            INSERT INTO notifications (
                id, user_id, type, title, message, link, metadata, read, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(notification.id.as_uuid())
        .bind(notification.user_id.as_str())
        .bind(notification.kind.as_str())
        .bind(notification.title.as_str())
        .bind(notification.message.as_str())
        .bind(notification.link.as_deref())
        .bind(notification.metadata.clone().map(Json))
        .bind(notification.read)
        .bind(notification.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            if error
                .as_database_error()
                .is_some_and(|database_error| database_error.is_unique_violation())
            {
                return AppError::Conflict(format!(
                    "notification '{}' already exists",
                    notification.id
                ));
            }
            AppError::Upstream(format!("failed to insert notification: {error}"))
        })?;

        Notification::try_from(row)
    }

    async fn set_read(
        &self,
        notification_id: NotificationId,
        read: bool,
    ) -> AppResult<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            UPDATE notifications
            SET read = $2
            WHERE id = $1
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(notification_id.as_uuid())
        .bind(read)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Upstream(format!(
                "failed to update notification '{notification_id}': {error}"
            ))
        })?;

        row.map(Notification::try_from).transpose()
    }

    async fn delete_notification(&self, notification_id: NotificationId) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(notification_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Upstream(format!(
                "failed to delete notification '{notification_id}': {error}"
            ))
        })?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use sqlx::PgPool;
    use sqlx::migrate::Migrator;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;
    use wereport_application::NotificationRepository;
    use wereport_domain::{NewNotification, NewNotificationInput, Notification, NotificationId};

    use super::PostgresNotificationRepository;

    static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

    async fn test_pool() -> Option<PgPool> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            return None;
        };

        let pool = match PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url.as_str())
            .await
        {
            Ok(pool) => pool,
            Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
        };

        if let Err(error) = MIGRATOR.run(&pool).await {
            panic!("failed to run migrations for postgres notification tests: {error}");
        }

        Some(pool)
    }

    fn notification(user_id: &str) -> Notification {
        let input: NewNotificationInput = serde_json::from_value(json!({
            "user_id": user_id,
            "type": "issue_update",
            "title": "Issue updated",
            "message": "The pothole on Harbour Street was patched",
            "link": "https://wereport.example.org/issues/42",
            "metadata": { "issue": 42 }
        }))
        .unwrap_or_else(|error| panic!("invalid test notification: {error}"));
        let new = NewNotification::new(input)
            .unwrap_or_else(|error| panic!("invalid test notification: {error}"));

        Notification::create(NotificationId::new(), new, Utc::now())
    }

    #[tokio::test]
    async fn stored_notification_round_trips_metadata() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let repository = PostgresNotificationRepository::new(pool);
        let user_id = format!("pg-user-{}", Uuid::new_v4());
        let stored = notification(&user_id);
        assert!(repository.insert_notification(stored.clone()).await.is_ok());

        let listed = repository
            .list_notifications(&user_id, true, 10)
            .await
            .unwrap_or_default();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].metadata, stored.metadata);
        assert_eq!(listed[0].link, stored.link);
    }

    #[tokio::test]
    async fn read_flag_and_delete_follow_row_presence() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let repository = PostgresNotificationRepository::new(pool);
        let user_id = format!("pg-user-{}", Uuid::new_v4());
        let stored = notification(&user_id);
        let notification_id = stored.id;
        assert!(repository.insert_notification(stored).await.is_ok());

        let read = repository.set_read(notification_id, true).await;
        assert!(matches!(read, Ok(Some(entry)) if entry.read));
        assert!(
            repository
                .list_notifications(&user_id, true, 10)
                .await
                .unwrap_or_default()
                .is_empty()
        );

        assert!(matches!(repository.delete_notification(notification_id).await, Ok(true)));
        assert!(matches!(repository.delete_notification(notification_id).await, Ok(false)));
        assert!(matches!(repository.set_read(notification_id, false).await, Ok(None)));
    }
}
