use std::sync::Arc;

use chrono::{DateTime, Local, NaiveTime, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};

use emociograma_core::{AppError, AppResult, OrganizationId, UserIdentity};
use emociograma_domain::{
    Alert, AlertId, AlertNotification, AlertResolution, AlertSeverity, AlertStatistics,
    AlertType, Locale, NotificationStatus, OrganizationSettings, Scope, SeverityCounts,
    Submission, SubmissionId, SystemRole, alert_message, emotion_label,
};

use crate::alert_ports::{AlertListQuery, AlertRepository, EmailMessage, EmailService};
use crate::authorization_service::AuthorizationService;
use crate::organization_ports::OrganizationRepository;
use crate::role_ports::ManagerContact;
use crate::role_service::RoleDirectoryService;

mod notification;
mod queries;
mod resolution;
mod trigger;

/// Application service owning the alert lifecycle.
#[derive(Clone)]
pub struct AlertService {
    alerts: Arc<dyn AlertRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    roles: RoleDirectoryService,
    authorization: AuthorizationService,
    email: Arc<dyn EmailService>,
}

impl AlertService {
    /// Creates a new alert service.
    #[must_use]
    pub fn new(
        alerts: Arc<dyn AlertRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        roles: RoleDirectoryService,
        authorization: AuthorizationService,
        email: Arc<dyn EmailService>,
    ) -> Self {
        Self {
            alerts,
            organizations,
            roles,
            authorization,
            email,
        }
    }

    async fn require_manager(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
    ) -> AppResult<()> {
        self.authorization
            .require_role(
                actor,
                Scope::Organization(organization_id),
                SystemRole::Manager,
            )
            .await
    }

    async fn settings_for(&self, organization_id: OrganizationId) -> AppResult<OrganizationSettings> {
        self.organizations
            .find_by_id(organization_id)
            .await?
            .map(|organization| organization.settings().clone())
            .ok_or_else(|| {
                AppError::NotFound(format!("organization '{organization_id}' was not found"))
            })
    }
}
