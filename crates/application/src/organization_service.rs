use std::sync::Arc;

use tracing::info;

use emociograma_core::{AppError, AppResult, OrganizationId, UserIdentity};
use emociograma_domain::{
    DEFAULT_ALERT_THRESHOLD, NewOrganizationInput, Organization, OrganizationSettings, Scope,
    SystemRole,
};

use crate::authorization_service::AuthorizationService;
use crate::organization_ports::OrganizationRepository;

/// Application service for the organization hierarchy and its settings.
#[derive(Clone)]
pub struct OrganizationService {
    repository: Arc<dyn OrganizationRepository>,
    authorization: AuthorizationService,
}

impl OrganizationService {
    /// Creates a new organization service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn OrganizationRepository>,
        authorization: AuthorizationService,
    ) -> Self {
        Self {
            repository,
            authorization,
        }
    }

    /// Creates an organization; requires a global admin.
    pub async fn create_organization(
        &self,
        actor: &UserIdentity,
        input: NewOrganizationInput,
    ) -> AppResult<Organization> {
        self.authorization
            .require_role(actor, Scope::Global, SystemRole::Admin)
            .await?;

        if let Some(parent_id) = input.parent_id {
            self.require_live(parent_id).await?;
        }

        let organization = Organization::new(input)?;
        if self
            .repository
            .find_by_slug(organization.slug())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "organization slug '{}' is already in use",
                organization.slug()
            )));
        }

        self.repository.insert(&organization).await?;

        info!(
            organization_id = %organization.id(),
            slug = organization.slug(),
            created_by = %actor.user_id(),
            "organization created"
        );

        Ok(organization)
    }

    /// Finds an organization by id, including deactivated ones.
    pub async fn find_by_id(&self, organization_id: OrganizationId) -> AppResult<Organization> {
        self.repository
            .find_by_id(organization_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("organization '{organization_id}' was not found"))
            })
    }

    /// Finds a non-deleted organization by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Organization> {
        self.repository
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("organization '{slug}' was not found")))
    }

    /// Lists non-deleted children.
    pub async fn list_children(&self, parent_id: OrganizationId) -> AppResult<Vec<Organization>> {
        self.repository.list_children(parent_id).await
    }

    /// Replaces organization settings; requires an admin of the organization.
    pub async fn update_settings(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
        settings: OrganizationSettings,
    ) -> AppResult<Organization> {
        self.authorization
            .require_role(actor, Scope::Organization(organization_id), SystemRole::Admin)
            .await?;

        let mut organization = self.require_live(organization_id).await?;
        organization.update_settings(settings)?;
        self.repository.update(&organization).await?;

        info!(
            organization_id = %organization_id,
            alert_threshold = organization.settings().alert_threshold,
            "organization settings updated"
        );

        Ok(organization)
    }

    /// Soft deletes an organization without live children.
    pub async fn deactivate(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
    ) -> AppResult<Organization> {
        self.authorization
            .require_role(actor, Scope::Organization(organization_id), SystemRole::Admin)
            .await?;

        let mut organization = self.find_by_id(organization_id).await?;
        let children = self.repository.list_children(organization_id).await?;
        if !children.is_empty() {
            return Err(AppError::Conflict(format!(
                "organization '{organization_id}' still has {} active children",
                children.len()
            )));
        }

        organization.deactivate()?;
        self.repository.update(&organization).await?;

        info!(organization_id = %organization_id, "organization deactivated");

        Ok(organization)
    }

    /// Effective alert threshold of an organization.
    pub async fn alert_threshold(&self, organization_id: OrganizationId) -> AppResult<u8> {
        Ok(self
            .repository
            .find_by_id(organization_id)
            .await?
            .map_or(DEFAULT_ALERT_THRESHOLD, |organization| {
                organization.settings().alert_threshold
            }))
    }

    async fn require_live(&self, organization_id: OrganizationId) -> AppResult<Organization> {
        self.repository
            .find_by_id(organization_id)
            .await?
            .filter(|organization| !organization.is_deleted())
            .ok_or_else(|| {
                AppError::NotFound(format!("organization '{organization_id}' was not found"))
            })
    }
}
