use async_trait::async_trait;
use chrono::{DateTime, Utc};
use emociograma_application::{SubmissionListQuery, SubmissionRepository};
use emociograma_core::{AppError, AppResult, OrganizationId, UserId};
use emociograma_domain::{Submission, SubmissionId, SubmissionSnapshot};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::organization_scope::{begin_organization_scope, commit};

/// PostgreSQL-backed check-in store.
#[derive(Clone)]
pub struct PostgresSubmissionRepository {
    pool: PgPool,
}

impl PostgresSubmissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SubmissionRow {
    id: Uuid,
    organization_id: Uuid,
    user_id: Uuid,
    emotion_level: i16,
    emotion_emoji: String,
    category_id: String,
    is_anonymous: bool,
    comment: Option<String>,
    comment_flagged: bool,
    submitted_at: DateTime<Utc>,
    department: Option<String>,
    team: Option<String>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = AppError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let emotion_level = u8::try_from(row.emotion_level).map_err(|_| {
            AppError::Internal(format!(
                "submission '{}' has out of range emotion level {}",
                row.id, row.emotion_level
            ))
        })?;

        Submission::restore(SubmissionSnapshot {
            id: SubmissionId::from_uuid(row.id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            user_id: UserId::from_uuid(row.user_id),
            emotion_level,
            emotion_emoji: row.emotion_emoji,
            category_id: row.category_id,
            is_anonymous: row.is_anonymous,
            comment: row.comment,
            comment_flagged: row.comment_flagged,
            submitted_at: row.submitted_at,
            department: row.department,
            team: row.team,
        })
    }
}

fn page_bounds(query: &SubmissionListQuery) -> (Option<i64>, i64) {
    let limit = query
        .limit
        .map(|limit| i64::try_from(limit).unwrap_or(i64::MAX));
    let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);
    (limit, offset)
}

#[async_trait]
impl SubmissionRepository for PostgresSubmissionRepository {
    async fn insert(&self, submission: &Submission) -> AppResult<()> {
        let mut transaction =
            begin_organization_scope(&self.pool, submission.organization_id()).await?;

        sqlx::query(
            r#"
            INSERT INTO emociograma_submissions (
                id, organization_id, user_id, emotion_level, emotion_emoji, category_id,
                is_anonymous, comment, comment_flagged, submitted_at, department, team
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(submission.id().as_uuid())
        .bind(submission.organization_id().as_uuid())
        .bind(submission.user_id().as_uuid())
        .bind(i16::from(submission.emotion_level().value()))
        .bind(submission.emotion_emoji())
        .bind(submission.category_id())
        .bind(submission.is_anonymous())
        .bind(submission.comment())
        .bind(submission.comment_flagged())
        .bind(submission.submitted_at())
        .bind(submission.department())
        .bind(submission.team())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert submission: {error}")))?;

        commit(transaction).await
    }

    async fn find_by_id(&self, submission_id: SubmissionId) -> AppResult<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, organization_id, user_id, emotion_level, emotion_emoji, category_id,
                   is_anonymous, comment, comment_flagged, submitted_at, department, team
            FROM emociograma_submissions
            WHERE id = $1
            "#,
        )
        .bind(submission_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find submission '{submission_id}': {error}"
            ))
        })?;

        row.map(Submission::try_from).transpose()
    }

    async fn list_by_organization(
        &self,
        organization_id: OrganizationId,
        query: &SubmissionListQuery,
    ) -> AppResult<Vec<Submission>> {
        let (limit, offset) = page_bounds(query);
        let mut transaction = begin_organization_scope(&self.pool, organization_id).await?;

        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, organization_id, user_id, emotion_level, emotion_emoji, category_id,
                   is_anonymous, comment, comment_flagged, submitted_at, department, team
            FROM emociograma_submissions
            WHERE organization_id = $1
              AND ($2::timestamptz IS NULL OR submitted_at >= $2)
              AND ($3::timestamptz IS NULL OR submitted_at <= $3)
            ORDER BY submitted_at DESC, id
            LIMIT $4
            OFFSET $5
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(query.from)
        .bind(query.to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list submissions: {error}")))?;

        commit(transaction).await?;

        rows.into_iter().map(Submission::try_from).collect()
    }

    async fn purge_submitted_before(
        &self,
        organization_id: OrganizationId,
        cutoff: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut transaction = begin_organization_scope(&self.pool, organization_id).await?;

        let result = sqlx::query(
            r#"
            DELETE FROM emociograma_submissions
            WHERE organization_id = $1
              AND submitted_at < $2
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(cutoff)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to purge submissions: {error}")))?;

        commit(transaction).await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use emociograma_application::{SubmissionListQuery, SubmissionRepository};
    use emociograma_core::{OrganizationId, UserId};
    use emociograma_domain::{NewSubmissionInput, Submission, SubmissionId, SubmissionSnapshot};
    use sqlx::PgPool;
    use sqlx::migrate::Migrator;
    use sqlx::postgres::PgPoolOptions;

    use super::PostgresSubmissionRepository;

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
            panic!("failed to run migrations for postgres submission tests: {error}");
        }

        Some(pool)
    }

    async fn seed_member(pool: &PgPool) -> (OrganizationId, UserId) {
        let organization_id = OrganizationId::new();
        let user_id = UserId::new();

        let organization = sqlx::query(
            r#"
                INSERT INTO organizations (id, name, slug, organization_type)
                VALUES ($1, 'Submission Org', $2, 'company')
                "#,
        )
        .bind(organization_id.as_uuid())
        .bind(format!("submission-{organization_id}"))
        .execute(pool)
        .await;
        assert!(organization.is_ok());

        let user = sqlx::query(
            r#"
                INSERT INTO users (id, email, display_name)
                VALUES ($1, $2, 'Submitter')
                "#,
        )
        .bind(user_id.as_uuid())
        .bind(format!("{user_id}@example.com"))
        .execute(pool)
        .await;
        assert!(user.is_ok());

        (organization_id, user_id)
    }

    #[tokio::test]
    async fn purge_removes_only_submissions_outside_window() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let repository = PostgresSubmissionRepository::new(pool.clone());
        let (organization_id, user_id) = seed_member(&pool).await;

        let recent = Submission::new(
            organization_id,
            user_id,
            NewSubmissionInput {
                emotion_level: 4,
                emotion_emoji: "🙂".to_owned(),
                category_id: "work".to_owned(),
                is_anonymous: None,
                comment: Some("fine".to_owned()),
                department: None,
                team: Some("Backend".to_owned()),
            },
            true,
        )
        .unwrap_or_else(|_| unreachable!());
        let stale = Submission::restore(SubmissionSnapshot {
            id: SubmissionId::new(),
            organization_id,
            user_id,
            emotion_level: 8,
            emotion_emoji: "😢".to_owned(),
            category_id: "work".to_owned(),
            is_anonymous: false,
            comment: None,
            comment_flagged: false,
            submitted_at: Utc::now() - Duration::days(400),
            department: None,
            team: None,
        })
        .unwrap_or_else(|_| unreachable!());

        assert!(repository.insert(&recent).await.is_ok());
        assert!(repository.insert(&stale).await.is_ok());

        let purged = repository
            .purge_submitted_before(organization_id, Utc::now() - Duration::days(365))
            .await;
        assert!(matches!(purged, Ok(1)));

        let remaining = repository
            .list_by_organization(organization_id, &SubmissionListQuery::default())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id(), recent.id());
        assert!(remaining[0].is_anonymous());
        assert_eq!(remaining[0].team(), Some("Backend"));
    }
}
