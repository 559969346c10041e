use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use emociograma_core::{AppError, AppResult, OrganizationId, UserId};
use emociograma_domain::{Role, RoleAssignment, RoleId, Scope, SystemRole};

use crate::role_ports::{AssignRoleInput, ManagerContact, RoleRepository};

/// Authoritative source of who holds which role where.
#[derive(Clone)]
pub struct RoleDirectoryService {
    repository: Arc<dyn RoleRepository>,
}

impl RoleDirectoryService {
    /// Creates a new service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn RoleRepository>) -> Self {
        Self { repository }
    }

    /// Returns the role with the given name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Role> {
        self.repository
            .find_role_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{name}' was not found")))
    }

    /// Records a role assignment.
    ///
    /// Returns `Conflict` when the exact triple is already recorded, including
    /// when a concurrent writer inserts it between the check and the insert.
    pub async fn assign_role_to_user(&self, input: AssignRoleInput) -> AppResult<()> {
        let AssignRoleInput {
            user_id,
            role_id,
            scope,
            assigned_by,
        } = input;

        let role = self
            .repository
            .find_role_by_id(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        if let Scope::Organization(role_organization_id) = role.scope()
            && scope != Scope::Organization(role_organization_id)
        {
            return Err(AppError::Validation(format!(
                "role '{}' belongs to organization '{role_organization_id}' and cannot be \
                 assigned in scope '{scope}'",
                role.name().as_str()
            )));
        }

        if self
            .repository
            .assignment_exists(user_id, role_id, scope)
            .await?
        {
            return Err(duplicate_assignment(user_id, &role, scope));
        }

        self.repository
            .insert_assignment(RoleAssignment {
                user_id,
                role_id,
                scope,
                assigned_by,
                assigned_at: Utc::now(),
            })
            .await
            .map_err(|error| match error {
                AppError::Conflict(_) => duplicate_assignment(user_id, &role, scope),
                other => other,
            })?;

        info!(
            user_id = %user_id,
            role = role.name().as_str(),
            scope = %scope,
            "role assigned"
        );

        Ok(())
    }

    /// Checks the exact scope only; a global check never matches organization assignments.
    pub async fn user_has_role_in_organization(
        &self,
        user_id: UserId,
        role_id: RoleId,
        organization_id: Option<OrganizationId>,
    ) -> AppResult<bool> {
        self.repository
            .assignment_exists(user_id, role_id, Scope::from(organization_id))
            .await
    }

    /// Removes the exact (user, role, scope) assignment; removing a missing one is a no-op.
    pub async fn remove_role_from_user(
        &self,
        user_id: UserId,
        role_id: RoleId,
        organization_id: Option<OrganizationId>,
    ) -> AppResult<()> {
        let scope = Scope::from(organization_id);
        let removed = self
            .repository
            .delete_assignment(user_id, role_id, scope)
            .await?;

        if removed == 0 {
            debug!(user_id = %user_id, role_id = %role_id, scope = %scope, "no assignment to remove");
        } else {
            info!(user_id = %user_id, role_id = %role_id, scope = %scope, "role removed");
        }

        Ok(())
    }

    /// Returns role names held in the organization plus every global role.
    pub async fn get_roles_by_organization(
        &self,
        user_id: UserId,
        organization_id: Option<OrganizationId>,
    ) -> AppResult<BTreeSet<String>> {
        Ok(self
            .effective_roles(user_id, organization_id)
            .await?
            .into_iter()
            .map(|role| String::from(role.name().clone()))
            .collect())
    }

    /// Returns roles held in the organization plus every global role.
    pub async fn effective_roles(
        &self,
        user_id: UserId,
        organization_id: Option<OrganizationId>,
    ) -> AppResult<Vec<Role>> {
        let scopes = match organization_id {
            Some(organization_id) => vec![Scope::Organization(organization_id), Scope::Global],
            None => vec![Scope::Global],
        };

        self.repository.list_roles_for_user(user_id, &scopes).await
    }

    /// Lists every assignment of a user.
    pub async fn list_assignments(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        self.repository.list_assignments_for_user(user_id).await
    }

    /// Lists users holding a manager-tier role scoped to the organization.
    ///
    /// Global role holders are not enrolled; only organization-scoped
    /// assignments count.
    pub async fn list_organization_managers(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<ManagerContact>> {
        self.repository
            .list_organization_members_with_roles(organization_id, SystemRole::manager_tier())
            .await
    }
}

fn duplicate_assignment(user_id: UserId, role: &Role, scope: Scope) -> AppError {
    AppError::Conflict(format!(
        "user '{user_id}' already holds role '{}' in scope '{scope}'",
        role.name().as_str()
    ))
}
