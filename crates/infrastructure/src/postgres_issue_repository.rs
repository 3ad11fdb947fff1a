use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use wereport_application::{CommentRepository, IssuePage, IssueRepository, UpvoteOutcome};
use wereport_core::{AppError, AppResult};
use wereport_domain::{
    Comment, Coordinates, Issue, IssueCategory, IssueId, IssueSearch, IssueSort, IssueStatus,
    PageRequest, Severity,
};


const ISSUE_COLUMNS: &str = "id, user_id, title, description, category, severity, status, \
     location, latitude, longitude, image_urls, upvotes, assigned_authority, created_at, updated_at";

/// PostgreSQL-backed issue, upvote and comment repository.
#[derive(Clone)]
pub struct PostgresIssueRepository {
    pool: PgPool,
}

impl PostgresIssueRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count_upvotes(&self, issue_id: IssueId) -> AppResult<u32> {
        let upvotes = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT upvotes
            FROM issues
            WHERE id = $1
            "#,
        )
        .bind(issue_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Upstream(format!("failed to read upvotes of issue '{issue_id}': {error}"))
        })?
        .ok_or_else(|| AppError::NotFound(format!("issue '{issue_id}' does not exist")))?;

        Ok(u32::try_from(upvotes).unwrap_or(0))
    }
}

#[derive(Debug, FromRow)]
struct IssueRow {
    id: Uuid,
    user_id: String,
    title: String,
    description: String,
    category: String,
    severity: i16,
    status: String,
    location: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    image_urls: Vec<String>,
    upvotes: i32,
    assigned_authority: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<IssueRow> for Issue {
    type Error = AppError;

    fn try_from(row: IssueRow) -> Result<Self, Self::Error> {
        let coordinates = match (row.latitude, row.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)?),
            _ => None,
        };

        Ok(Self {
            id: IssueId::from_uuid(row.id),
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            category: IssueCategory::parse(row.category.as_str())?,
            severity: Severity::new(i64::from(row.severity))?,
            status: IssueStatus::parse(row.status.as_str())?,
            location: row.location,
            coordinates,
            image_urls: row.image_urls,
            upvotes: u32::try_from(row.upvotes).unwrap_or(0),
            assigned_authority: row.assigned_authority,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: Uuid,
    issue_id: Uuid,
    user_id: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            issue_id: IssueId::from_uuid(row.issue_id),
            user_id: row.user_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

fn into_issues(rows: Vec<IssueRow>) -> AppResult<Vec<Issue>> {
    rows.into_iter().map(Issue::try_from).collect()
}

fn push_search_filters<'args>(builder: &mut QueryBuilder<'args, Postgres>, search: &IssueSearch) {
    builder.push(" WHERE TRUE");

    if let Some(pattern) = search.like_pattern() {
        builder.push(" AND (title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR description ILIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\')");
    }

    if let Some(category) = search.category() {
        builder.push(" AND category = ");
        builder.push_bind(category.as_str());
    }

    if let Some(status) = search.status() {
        builder.push(" AND status = ");
        builder.push_bind(status.as_str());
    }
}

fn order_clause(sort: IssueSort) -> &'static str {
    match sort {
        IssueSort::Newest => " ORDER BY created_at DESC",
        IssueSort::Upvotes | IssueSort::Trending => " ORDER BY upvotes DESC, created_at DESC",
    }
}

fn uuids(issue_ids: &[IssueId]) -> Vec<Uuid> {
    issue_ids.iter().map(IssueId::as_uuid).collect()
}

#[async_trait]
impl IssueRepository for PostgresIssueRepository {
    async fn insert_issue(&self, issue: Issue) -> AppResult<Issue> {
        let row = sqlx::query_as::<_, IssueRow>(&format!(
            r#"
            INSERT INTO issues (
                id, user_id, title, description, category, severity, status, location,
                latitude, longitude, image_urls, upvotes, assigned_authority, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {ISSUE_COLUMNS}
            "#
        ))
        .bind(issue.id.as_uuid())
        .bind(issue.user_id.as_str())
        .bind(issue.title.as_str())
        .bind(issue.description.as_str())
        .bind(issue.category.as_str())
        .bind(i16::from(issue.severity.value()))
        .bind(issue.status.as_str())
        .bind(issue.location.as_str())
        .bind(issue.coordinates.map(|coordinates| coordinates.lat()))
        .bind(issue.coordinates.map(|coordinates| coordinates.lng()))
        .bind(&issue.image_urls)
        .bind(i32::try_from(issue.upvotes).unwrap_or(i32::MAX))
        .bind(issue.assigned_authority.as_deref())
        .bind(issue.created_at)
        .bind(issue.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            if error
                .as_database_error()
                .is_some_and(|database_error| database_error.is_unique_violation())
            {
                return AppError::Conflict(format!("issue '{}' already exists", issue.id));
            }
            AppError::Upstream(format!("failed to insert issue: {error}"))
        })?;

        Issue::try_from(row)
    }

    async fn find_issue(&self, issue_id: IssueId) -> AppResult<Option<Issue>> {
        let row = sqlx::query_as::<_, IssueRow>(&format!(
            r#"
            SELECT {ISSUE_COLUMNS}
            FROM issues
            WHERE id = $1
            "#
        ))
        .bind(issue_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Upstream(format!("failed to find issue '{issue_id}': {error}"))
        })?;

        row.map(Issue::try_from).transpose()
    }

    async fn list_issues(&self, page: PageRequest) -> AppResult<IssuePage> {
        let rows = sqlx::query_as::<_, IssueRow>(&format!(
            r#"
            SELECT {ISSUE_COLUMNS}
            FROM issues
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(i64::from(page.limit()))
        .bind(i64::from(page.offset()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Upstream(format!("failed to list issues: {error}")))?;

        let total = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM issues")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Upstream(format!("failed to count issues: {error}")))?;

        Ok(IssuePage {
            issues: into_issues(rows)?,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn search_issues(&self, search: &IssueSearch) -> AppResult<IssuePage> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {ISSUE_COLUMNS} FROM issues"));
        push_search_filters(&mut builder, search);
        builder.push(order_clause(search.sort()));
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(search.page().limit()));
        builder.push(" OFFSET ");
        builder.push_bind(i64::from(search.page().offset()));

        let rows = builder
            .build_query_as::<IssueRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Upstream(format!("failed to search issues: {error}")))?;

        let mut count_builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT count(*) FROM issues");
        push_search_filters(&mut count_builder, search);

        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|error| {
                AppError::Upstream(format!("failed to count matching issues: {error}"))
            })?;

        Ok(IssuePage {
            issues: into_issues(rows)?,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn list_issues_by_status(
        &self,
        status: IssueStatus,
        limit: u32,
    ) -> AppResult<Vec<Issue>> {
        let rows = sqlx::query_as::<_, IssueRow>(&format!(
            r#"
            SELECT {ISSUE_COLUMNS}
            FROM issues
            WHERE status = $1
            ORDER BY upvotes DESC, created_at DESC
            LIMIT $2
            "#
        ))
        .bind(status.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Upstream(format!(
                "failed to list issues with status '{}': {error}",
                status.as_str()
            ))
        })?;

        into_issues(rows)
    }

    async fn list_most_upvoted(&self, limit: u32) -> AppResult<Vec<Issue>> {
        let rows = sqlx::query_as::<_, IssueRow>(&format!(
            r#"
            SELECT {ISSUE_COLUMNS}
            FROM issues
            ORDER BY upvotes DESC, created_at DESC
            LIMIT $1
            "#
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Upstream(format!("failed to list most upvoted issues: {error}"))
        })?;

        into_issues(rows)
    }

    async fn add_upvote(&self, issue_id: IssueId, user_id: &str) -> AppResult<UpvoteOutcome> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Upstream(format!("failed to begin transaction: {error}"))
        })?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO issue_upvotes (issue_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (issue_id, user_id) DO NOTHING
            "#,
        )
        .bind(issue_id.as_uuid())
        .bind(user_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            if error
                .as_database_error()
                .is_some_and(|database_error| database_error.is_foreign_key_violation())
            {
                return AppError::NotFound(format!("issue '{issue_id}' does not exist"));
            }
            AppError::Upstream(format!("failed to record upvote: {error}"))
        })?
        .rows_affected();

        if inserted == 0 {
            transaction.rollback().await.map_err(|error| {
                AppError::Upstream(format!("failed to roll back transaction: {error}"))
            })?;
            let upvotes = self.count_upvotes(issue_id).await?;
            return Ok(UpvoteOutcome {
                changed: false,
                upvotes,
            });
        }

        let upvotes = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE issues
            SET upvotes = upvotes + 1
            WHERE id = $1
            RETURNING upvotes
            "#,
        )
        .bind(issue_id.as_uuid())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Upstream(format!("failed to increment upvotes: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Upstream(format!("failed to commit transaction: {error}"))
        })?;

        Ok(UpvoteOutcome {
            changed: true,
            upvotes: u32::try_from(upvotes).unwrap_or(0),
        })
    }

    async fn remove_upvote(&self, issue_id: IssueId, user_id: &str) -> AppResult<UpvoteOutcome> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Upstream(format!("failed to begin transaction: {error}"))
        })?;

        let removed = sqlx::query(
            r#"
            DELETE FROM issue_upvotes
            WHERE issue_id = $1 AND user_id = $2
            "#,
        )
        .bind(issue_id.as_uuid())
        .bind(user_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Upstream(format!("failed to remove upvote: {error}")))?
        .rows_affected();

        if removed == 0 {
            transaction.rollback().await.map_err(|error| {
                AppError::Upstream(format!("failed to roll back transaction: {error}"))
            })?;
            let upvotes = self.count_upvotes(issue_id).await?;
            return Ok(UpvoteOutcome {
                changed: false,
                upvotes,
            });
        }

        let upvotes = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE issues
            SET upvotes = GREATEST(upvotes - 1, 0)
            WHERE id = $1
            RETURNING upvotes
            "#,
        )
        .bind(issue_id.as_uuid())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Upstream(format!("failed to decrement upvotes: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Upstream(format!("failed to commit transaction: {error}"))
        })?;

        Ok(UpvoteOutcome {
            changed: true,
            upvotes: u32::try_from(upvotes).unwrap_or(0),
        })
    }

    async fn update_status(
        &self,
        issue_ids: &[IssueId],
        status: IssueStatus,
        updated_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE issues
            SET status = $2, updated_at = $3
            WHERE id = ANY($1)
            "#,
        )
        .bind(uuids(issue_ids))
        .bind(status.as_str())
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Upstream(format!("failed to update issue status: {error}")))?;

        Ok(result.rows_affected())
    }

    async fn delete_issues(&self, issue_ids: &[IssueId]) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM issues
            WHERE id = ANY($1)
            "#,
        )
        .bind(uuids(issue_ids))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Upstream(format!("failed to delete issues: {error}")))?;

        Ok(result.rows_affected())
    }

    async fn update_issue(&self, issue: &Issue) -> AppResult<Option<Issue>> {
        let row = sqlx::query_as::<_, IssueRow>(&format!(
            r#"
            UPDATE issues
            SET title = $2,
                description = $3,
                category = $4,
                severity = $5,
                status = $6,
                assigned_authority = $7,
                updated_at = $8
            WHERE id = $1
            RETURNING {ISSUE_COLUMNS}
            "#
        ))
        .bind(issue.id.as_uuid())
        .bind(issue.title.as_str())
        .bind(issue.description.as_str())
        .bind(issue.category.as_str())
        .bind(i16::from(issue.severity.value()))
        .bind(issue.status.as_str())
        .bind(issue.assigned_authority.as_deref())
        .bind(issue.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Upstream(format!("failed to update issue '{}': {error}", issue.id))
        })?;

        row.map(Issue::try_from).transpose()
    }

    async fn count_by_status(&self) -> AppResult<Vec<(IssueStatus, u64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT status, COUNT(*)
            FROM issues
            GROUP BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Upstream(format!("failed to count issues: {error}")))?;

        rows.into_iter()
            .map(|(status, count)| {
                Ok((
                    IssueStatus::parse(status.as_str())?,
                    u64::try_from(count).unwrap_or(0),
                ))
            })
            .collect()
    }
}

#[async_trait]
impl CommentRepository for PostgresIssueRepository {
    async fn insert_comment(&self, comment: Comment) -> AppResult<Comment> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO issue_comments (id, issue_id, user_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, issue_id, user_id, content, created_at
            "#,
        )
        .bind(comment.id)
        .bind(comment.issue_id.as_uuid())
        .bind(comment.user_id.as_str())
        .bind(comment.content.as_str())
        .bind(comment.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            if error
                .as_database_error()
                .is_some_and(|database_error| database_error.is_foreign_key_violation())
            {
                return AppError::NotFound(format!(
                    "issue '{}' does not exist",
                    comment.issue_id
                ));
            }
            AppError::Upstream(format!("failed to insert comment: {error}"))
        })?;

        Ok(Comment::from(row))
    }

    async fn list_comments(&self, issue_id: IssueId, limit: u32) -> AppResult<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, issue_id, user_id, content, created_at
            FROM issue_comments
            WHERE issue_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(issue_id.as_uuid())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Upstream(format!(
                "failed to list comments of issue '{issue_id}': {error}"
            ))
        })?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }
}
