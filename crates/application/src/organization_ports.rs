use async_trait::async_trait;

use emociograma_core::{AppResult, OrganizationId};
use emociograma_domain::Organization;

/// Repository port for the organization hierarchy.
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Finds an organization by id, including soft-deleted ones.
    async fn find_by_id(&self, organization_id: OrganizationId)
    -> AppResult<Option<Organization>>;

    /// Finds a non-deleted organization by slug.
    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Organization>>;

    /// Lists non-deleted children of an organization.
    async fn list_children(&self, parent_id: OrganizationId) -> AppResult<Vec<Organization>>;

    /// Lists active, non-deleted organizations.
    async fn list_operational(&self) -> AppResult<Vec<Organization>>;

    /// Persists a new organization.
    ///
    /// A slug already used by a non-deleted organization must surface as
    /// `AppError::Conflict`.
    async fn insert(&self, organization: &Organization) -> AppResult<()>;

    /// Persists settings, active flag and soft delete state.
    async fn update(&self, organization: &Organization) -> AppResult<()>;
}
