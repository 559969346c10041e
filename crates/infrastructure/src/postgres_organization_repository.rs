use async_trait::async_trait;
use chrono::{DateTime, Utc};
use emociograma_application::OrganizationRepository;
use emociograma_core::{AppError, AppResult, OrganizationId};
use emociograma_domain::{Organization, OrganizationSettings, OrganizationSnapshot};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::organization_scope::is_unique_violation;

/// PostgreSQL-backed organization hierarchy.
#[derive(Clone)]
pub struct PostgresOrganizationRepository {
    pool: PgPool,
}

impl PostgresOrganizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OrganizationRow {
    id: Uuid,
    name: String,
    slug: String,
    organization_type: String,
    parent_id: Option<Uuid>,
    settings: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrganizationRow> for Organization {
    type Error = AppError;

    fn try_from(row: OrganizationRow) -> Result<Self, Self::Error> {
        let settings = serde_json::from_str::<OrganizationSettings>(row.settings.as_str())
            .map_err(|error| {
                AppError::Internal(format!(
                    "organization '{}' has unreadable settings: {error}",
                    row.id
                ))
            })?;

        Organization::restore(OrganizationSnapshot {
            id: OrganizationId::from_uuid(row.id),
            name: row.name,
            slug: row.slug,
            organization_type: row.organization_type.parse()?,
            parent_id: row.parent_id.map(OrganizationId::from_uuid),
            settings,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

fn settings_json(organization: &Organization) -> AppResult<String> {
    serde_json::to_string(organization.settings()).map_err(|error| {
        AppError::Internal(format!("failed to serialize organization settings: {error}"))
    })
}

const ORGANIZATION_COLUMNS: &str = "id, name, slug, organization_type, parent_id, \
     settings::text AS settings, is_active, created_at, updated_at, deleted_at";

#[async_trait]
impl OrganizationRepository for PostgresOrganizationRepository {
    async fn find_by_id(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Option<Organization>> {
        let query = format!("SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = $1");
        let row = sqlx::query_as::<_, OrganizationRow>(query.as_str())
            .bind(organization_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to find organization '{organization_id}': {error}"
                ))
            })?;

        row.map(Organization::try_from).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Organization>> {
        let query = format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations \
             WHERE slug = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, OrganizationRow>(query.as_str())
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to find organization '{slug}': {error}"))
            })?;

        row.map(Organization::try_from).transpose()
    }

    async fn list_children(&self, parent_id: OrganizationId) -> AppResult<Vec<Organization>> {
        let query = format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations \
             WHERE parent_id = $1 AND deleted_at IS NULL \
             ORDER BY name"
        );
        let rows = sqlx::query_as::<_, OrganizationRow>(query.as_str())
            .bind(parent_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to list children of organization '{parent_id}': {error}"
                ))
            })?;

        rows.into_iter().map(Organization::try_from).collect()
    }

    async fn list_operational(&self) -> AppResult<Vec<Organization>> {
        let query = format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations \
             WHERE is_active AND deleted_at IS NULL \
             ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, OrganizationRow>(query.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to list active organizations: {error}"))
            })?;

        rows.into_iter().map(Organization::try_from).collect()
    }

    async fn insert(&self, organization: &Organization) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO organizations (
                id, name, slug, organization_type, parent_id, settings,
                is_active, created_at, updated_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6::jsonb, $7, $8, $9, $10)
            "#,
        )
        .bind(organization.id().as_uuid())
        .bind(organization.name().as_str())
        .bind(organization.slug())
        .bind(organization.organization_type().as_str())
        .bind(organization.parent_id().map(|parent_id| parent_id.as_uuid()))
        .bind(settings_json(organization)?)
        .bind(organization.is_active())
        .bind(organization.created_at())
        .bind(organization.updated_at())
        .bind(organization.deleted_at())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) if is_unique_violation(&error) => Err(AppError::Conflict(format!(
                "organization slug '{}' is already in use",
                organization.slug()
            ))),
            Err(error) => Err(AppError::Internal(format!(
                "failed to insert organization: {error}"
            ))),
        }
    }

    async fn update(&self, organization: &Organization) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE organizations
            SET settings = $2::jsonb,
                is_active = $3,
                updated_at = $4,
                deleted_at = $5
            WHERE id = $1
            "#,
        )
        .bind(organization.id().as_uuid())
        .bind(settings_json(organization)?)
        .bind(organization.is_active())
        .bind(organization.updated_at())
        .bind(organization.deleted_at())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update organization: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "organization '{}' was not found",
                organization.id()
            )));
        }

        Ok(())
    }
}
