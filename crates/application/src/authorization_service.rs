use emociograma_core::{AppError, AppResult, UserIdentity};
use emociograma_domain::{Scope, SystemRole};

use crate::role_service::RoleDirectoryService;

/// Application guard resolving role-based access from the role ledger.
#[derive(Clone)]
pub struct AuthorizationService {
    roles: RoleDirectoryService,
}

impl AuthorizationService {
    /// Creates a new authorization service over the role directory.
    #[must_use]
    pub fn new(roles: RoleDirectoryService) -> Self {
        Self { roles }
    }

    /// Ensures the actor holds `minimum` or a more privileged role in scope.
    ///
    /// Global roles count in every organization scope.
    pub async fn require_role(
        &self,
        actor: &UserIdentity,
        scope: Scope,
        minimum: SystemRole,
    ) -> AppResult<()> {
        if self.has_role(actor, scope, minimum).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{}' requires role '{}' in scope '{scope}'",
            actor.user_id(),
            minimum.as_str()
        )))
    }

    /// Returns whether the actor holds `minimum` or a more privileged role in scope.
    pub async fn has_role(
        &self,
        actor: &UserIdentity,
        scope: Scope,
        minimum: SystemRole,
    ) -> AppResult<bool> {
        let roles = self
            .roles
            .effective_roles(actor.user_id(), scope.organization_id())
            .await?;

        Ok(roles.iter().any(|role| role.satisfies(minimum)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use emociograma_core::{AppError, OrganizationId, UserId};
    use emociograma_domain::{Scope, SystemRole};

    use crate::role_service::RoleDirectoryService;
    use crate::test_support::{FakeRoleRepository, actor};

    use super::AuthorizationService;

    fn guard(repository: Arc<FakeRoleRepository>) -> AuthorizationService {
        AuthorizationService::new(RoleDirectoryService::new(repository))
    }

    #[tokio::test]
    async fn manager_passes_manager_guard_in_own_organization_only() {
        let repository = Arc::new(FakeRoleRepository::with_system_roles());
        let user_id = UserId::new();
        let organization_id = OrganizationId::new();
        repository
            .grant(user_id, SystemRole::Manager, Scope::Organization(organization_id))
            .await;
        let guard = guard(repository);

        let own = guard
            .require_role(
                &actor(user_id),
                Scope::Organization(organization_id),
                SystemRole::Manager,
            )
            .await;
        let other = guard
            .require_role(
                &actor(user_id),
                Scope::Organization(OrganizationId::new()),
                SystemRole::Manager,
            )
            .await;

        assert!(own.is_ok());
        assert!(matches!(other, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn contributor_fails_manager_guard() {
        let repository = Arc::new(FakeRoleRepository::with_system_roles());
        let user_id = UserId::new();
        let organization_id = OrganizationId::new();
        repository
            .grant(
                user_id,
                SystemRole::Contributor,
                Scope::Organization(organization_id),
            )
            .await;
        let guard = guard(repository);

        let result = guard
            .require_role(
                &actor(user_id),
                Scope::Organization(organization_id),
                SystemRole::Manager,
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn global_super_admin_passes_every_organization_guard() {
        let repository = Arc::new(FakeRoleRepository::with_system_roles());
        let user_id = UserId::new();
        repository
            .grant(user_id, SystemRole::SuperAdmin, Scope::Global)
            .await;
        let guard = guard(repository);

        let result = guard
            .has_role(
                &actor(user_id),
                Scope::Organization(OrganizationId::new()),
                SystemRole::Admin,
            )
            .await;

        assert!(matches!(result, Ok(true)));
    }

    #[tokio::test]
    async fn organization_admin_fails_global_guard() {
        let repository = Arc::new(FakeRoleRepository::with_system_roles());
        let user_id = UserId::new();
        repository
            .grant(
                user_id,
                SystemRole::Admin,
                Scope::Organization(OrganizationId::new()),
            )
            .await;
        let guard = guard(repository);

        let result = guard
            .require_role(&actor(user_id), Scope::Global, SystemRole::Admin)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
