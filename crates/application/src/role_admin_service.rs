use emociograma_core::{AppResult, OrganizationId, UserId, UserIdentity};
use emociograma_domain::{RoleAssignment, RoleId, Scope, SystemRole};

use crate::authorization_service::AuthorizationService;
use crate::role_ports::AssignRoleInput;
use crate::role_service::RoleDirectoryService;

/// Actor-facing role administration guarded by admin rights in scope.
#[derive(Clone)]
pub struct RoleAdministrationService {
    roles: RoleDirectoryService,
    authorization: AuthorizationService,
}

impl RoleAdministrationService {
    /// Creates a new role administration service.
    #[must_use]
    pub fn new(roles: RoleDirectoryService, authorization: AuthorizationService) -> Self {
        Self {
            roles,
            authorization,
        }
    }

    /// Assigns a role on behalf of an admin of the target scope.
    pub async fn assign(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        role_id: RoleId,
        organization_id: Option<OrganizationId>,
    ) -> AppResult<()> {
        let scope = Scope::from(organization_id);
        self.authorization
            .require_role(actor, scope, SystemRole::Admin)
            .await?;

        self.roles
            .assign_role_to_user(AssignRoleInput {
                user_id,
                role_id,
                scope,
                assigned_by: Some(actor.user_id()),
            })
            .await
    }

    /// Removes a role on behalf of an admin of the target scope.
    pub async fn unassign(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        role_id: RoleId,
        organization_id: Option<OrganizationId>,
    ) -> AppResult<()> {
        self.authorization
            .require_role(actor, Scope::from(organization_id), SystemRole::Admin)
            .await?;

        self.roles
            .remove_role_from_user(user_id, role_id, organization_id)
            .await
    }

    /// Lists a user's assignments visible to the actor.
    ///
    /// Global admins see every assignment; organization admins only see
    /// assignments scoped to that organization.
    pub async fn list_assignments(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        organization_id: Option<OrganizationId>,
    ) -> AppResult<Vec<RoleAssignment>> {
        let scope = Scope::from(organization_id);
        self.authorization
            .require_role(actor, scope, SystemRole::Admin)
            .await?;

        let assignments = self.roles.list_assignments(user_id).await?;
        if scope.is_global() {
            return Ok(assignments);
        }

        Ok(assignments
            .into_iter()
            .filter(|assignment| assignment.scope == scope)
            .collect())
    }
}
