use async_trait::async_trait;

use emociograma_core::{AppResult, OrganizationId, UserId};
use emociograma_domain::{Role, RoleAssignment, RoleId, Scope, SystemRole};

/// Contact details of a user entitled to alert notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerContact {
    /// Manager user identifier.
    pub user_id: UserId,
    /// Delivery address.
    pub email: String,
    /// Display name used in the greeting.
    pub display_name: String,
}

/// Input payload for recording a role assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignRoleInput {
    /// User receiving the role.
    pub user_id: UserId,
    /// Role being assigned.
    pub role_id: RoleId,
    /// Assignment scope.
    pub scope: Scope,
    /// User performing the assignment.
    pub assigned_by: Option<UserId>,
}

/// Repository port for role definitions and the assignment ledger.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Finds a role by its name.
    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    /// Finds a role by its identifier.
    async fn find_role_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Returns whether the exact (user, role, scope) triple is recorded.
    async fn assignment_exists(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: Scope,
    ) -> AppResult<bool>;

    /// Records an assignment.
    ///
    /// A storage-level uniqueness violation must surface as
    /// `AppError::Conflict`.
    async fn insert_assignment(&self, assignment: RoleAssignment) -> AppResult<()>;

    /// Deletes the exact (user, role, scope) triple and returns the affected count.
    async fn delete_assignment(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: Scope,
    ) -> AppResult<u64>;

    /// Lists roles the user holds in any of the given scopes.
    async fn list_roles_for_user(&self, user_id: UserId, scopes: &[Scope])
    -> AppResult<Vec<Role>>;

    /// Lists every assignment of a user across scopes.
    async fn list_assignments_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>>;

    /// Lists distinct users holding one of the given built-in roles through
    /// an assignment scoped to the organization.
    async fn list_organization_members_with_roles(
        &self,
        organization_id: OrganizationId,
        roles: &[SystemRole],
    ) -> AppResult<Vec<ManagerContact>>;
}
