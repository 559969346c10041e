use async_trait::async_trait;
use chrono::{DateTime, Utc};

use emociograma_core::{AppResult, OrganizationId};
use emociograma_domain::{
    Alert, AlertId, AlertNotification, AlertResolution, AlertSeverity, AlertStatistics,
    SeverityCounts, SubmissionId,
};

/// Query parameters for alert listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertListQuery {
    /// Maximum rows returned; unbounded when omitted.
    pub limit: Option<usize>,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
    /// Whether resolved alerts are included.
    pub include_resolved: bool,
    /// Optional exact severity filter.
    pub severity: Option<AlertSeverity>,
}

impl Default for AlertListQuery {
    fn default() -> Self {
        Self {
            limit: Some(10),
            offset: 0,
            include_resolved: false,
            severity: None,
        }
    }
}

impl AlertListQuery {
    /// Every unresolved alert, without pagination.
    #[must_use]
    pub fn unresolved() -> Self {
        Self {
            limit: None,
            ..Self::default()
        }
    }
}

/// Repository port for alerts.
///
/// Every listing is ordered by severity descending, then by creation time
/// descending, unless stated otherwise.
#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// Persists a new alert.
    ///
    /// A second alert for the same submission must surface as
    /// `AppError::Conflict`.
    async fn insert(&self, alert: &Alert) -> AppResult<()>;

    /// Finds an alert by id.
    async fn find_by_id(&self, alert_id: AlertId) -> AppResult<Option<Alert>>;

    /// Finds the alert raised by a submission.
    async fn find_by_submission(&self, submission_id: SubmissionId) -> AppResult<Option<Alert>>;

    /// Stores notification tracking.
    async fn save_notification(
        &self,
        alert_id: AlertId,
        notification: &AlertNotification,
        updated_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Stores a resolution if the alert is still unresolved.
    ///
    /// Returns `None` when the alert is missing or was already resolved.
    async fn save_resolution(
        &self,
        alert_id: AlertId,
        resolution: &AlertResolution,
    ) -> AppResult<Option<Alert>>;

    /// Resolves the currently unresolved subset of the given organization alerts.
    async fn resolve_unresolved(
        &self,
        organization_id: OrganizationId,
        alert_ids: &[AlertId],
        resolution: &AlertResolution,
    ) -> AppResult<u64>;

    /// Lists organization alerts.
    async fn list(
        &self,
        organization_id: OrganizationId,
        query: &AlertListQuery,
    ) -> AppResult<Vec<Alert>>;

    /// Lists organization alerts created within the inclusive range, most recent first.
    async fn list_created_between(
        &self,
        organization_id: OrganizationId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Alert>>;

    /// Aggregates organization alert figures.
    async fn statistics(
        &self,
        organization_id: OrganizationId,
        resolved_since: DateTime<Utc>,
    ) -> AppResult<AlertStatistics>;

    /// Counts unresolved organization alerts per severity.
    async fn count_unresolved_by_severity(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<SeverityCounts>;
}

/// Rendered email handed to the delivery service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html_body: String,
    /// Plain-text alternative.
    pub text_body: String,
}

/// Delivery receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    /// Provider message identifier.
    pub id: String,
}

/// Email delivery port.
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Sends one email.
    async fn send(&self, message: EmailMessage) -> AppResult<SentEmail>;
}
