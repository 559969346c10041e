use async_trait::async_trait;
use chrono::{DateTime, Utc};
use emociograma_application::{ManagerContact, RoleRepository};
use emociograma_core::{AppError, AppResult, OrganizationId, UserId};
use emociograma_domain::{Role, RoleAssignment, RoleId, Scope, SystemRole};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::organization_scope::is_unique_violation;

/// PostgreSQL-backed role definitions and assignment ledger.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    organization_id: Option<Uuid>,
    hierarchy_level: i32,
    is_system_role: bool,
}

impl TryFrom<RoleRow> for Role {
    type Error = AppError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        Role::new(
            RoleId::from_uuid(row.id),
            row.name,
            row.description,
            scope_from_column(row.organization_id),
            row.hierarchy_level,
            row.is_system_role,
        )
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    user_id: Uuid,
    role_id: Uuid,
    organization_id: Option<Uuid>,
    assigned_by: Option<Uuid>,
    assigned_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ContactRow {
    user_id: Uuid,
    email: String,
    display_name: String,
}

fn scope_from_column(organization_id: Option<Uuid>) -> Scope {
    Scope::from(organization_id.map(OrganizationId::from_uuid))
}

fn scope_to_column(scope: Scope) -> Option<Uuid> {
    scope
        .organization_id()
        .map(|organization_id| organization_id.as_uuid())
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, description, organization_id, hierarchy_level, is_system_role
            FROM roles
            WHERE name = $1
            ORDER BY organization_id NULLS FIRST
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role '{name}': {error}")))?;

        row.map(Role::try_from).transpose()
    }

    async fn find_role_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, description, organization_id, hierarchy_level, is_system_role
            FROM roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role '{role_id}': {error}")))?;

        row.map(Role::try_from).transpose()
    }

    async fn assignment_exists(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: Scope,
    ) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM user_roles
                WHERE user_id = $1
                  AND role_id = $2
                  AND organization_id IS NOT DISTINCT FROM $3
            )
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(scope_to_column(scope))
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to check role assignment: {error}"))
        })
    }

    async fn insert_assignment(&self, assignment: RoleAssignment) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id, organization_id, assigned_by, assigned_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(assignment.user_id.as_uuid())
        .bind(assignment.role_id.as_uuid())
        .bind(scope_to_column(assignment.scope))
        .bind(assignment.assigned_by.map(|user_id| user_id.as_uuid()))
        .bind(assignment.assigned_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) if is_unique_violation(&error) => Err(AppError::Conflict(format!(
                "role assignment already exists for user '{}' in scope '{}'",
                assignment.user_id, assignment.scope
            ))),
            Err(error) => Err(AppError::Internal(format!(
                "failed to insert role assignment: {error}"
            ))),
        }
    }

    async fn delete_assignment(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: Scope,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_roles
            WHERE user_id = $1
              AND role_id = $2
              AND organization_id IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(scope_to_column(scope))
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to delete role assignment: {error}"))
        })?;

        Ok(result.rows_affected())
    }

    async fn list_roles_for_user(
        &self,
        user_id: UserId,
        scopes: &[Scope],
    ) -> AppResult<Vec<Role>> {
        let include_global = scopes.iter().any(Scope::is_global);
        let organization_ids: Vec<Uuid> = scopes
            .iter()
            .filter_map(|scope| scope_to_column(*scope))
            .collect();

        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT DISTINCT r.id, r.name, r.description, r.organization_id,
                   r.hierarchy_level, r.is_system_role
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = $1
              AND ((ur.organization_id IS NULL AND $2) OR ur.organization_id = ANY($3))
            ORDER BY r.hierarchy_level, r.name
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(include_global)
        .bind(organization_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list roles for user '{user_id}': {error}"))
        })?;

        rows.into_iter().map(Role::try_from).collect()
    }

    async fn list_assignments_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT user_id, role_id, organization_id, assigned_by, assigned_at
            FROM user_roles
            WHERE user_id = $1
            ORDER BY assigned_at, organization_id NULLS FIRST
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list role assignments: {error}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| RoleAssignment {
                user_id: UserId::from_uuid(row.user_id),
                role_id: RoleId::from_uuid(row.role_id),
                scope: scope_from_column(row.organization_id),
                assigned_by: row.assigned_by.map(UserId::from_uuid),
                assigned_at: row.assigned_at,
            })
            .collect())
    }

    async fn list_organization_members_with_roles(
        &self,
        organization_id: OrganizationId,
        roles: &[SystemRole],
    ) -> AppResult<Vec<ManagerContact>> {
        let role_names: Vec<&str> = roles.iter().map(SystemRole::as_str).collect();

        let rows = sqlx::query_as::<_, ContactRow>(
            r#"
            SELECT DISTINCT ON (u.id) u.id AS user_id, u.email, u.display_name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            JOIN users u ON u.id = ur.user_id
            WHERE ur.organization_id = $1
              AND r.is_system_role
              AND r.name = ANY($2)
              AND u.is_active
            ORDER BY u.id
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(role_names)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list managers for organization '{organization_id}': {error}"
            ))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| ManagerContact {
                user_id: UserId::from_uuid(row.user_id),
                email: row.email,
                display_name: row.display_name,
            })
            .collect())
    }
}
