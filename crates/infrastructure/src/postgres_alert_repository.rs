use async_trait::async_trait;
use chrono::{DateTime, Utc};
use emociograma_application::{AlertListQuery, AlertRepository};
use emociograma_core::{AppError, AppResult, OrganizationId, UserId};
use emociograma_domain::{
    Alert, AlertId, AlertNotification, AlertResolution, AlertSnapshot, AlertStatistics,
    SeverityCounts, SubmissionId,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::organization_scope::{begin_organization_scope, commit, is_unique_violation};

mod lifecycle;
mod reporting;

/// PostgreSQL-backed alert store.
#[derive(Clone)]
pub struct PostgresAlertRepository {
    pool: PgPool,
}

impl PostgresAlertRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ALERT_COLUMNS: &str = "id, organization_id, submission_id, alert_type, severity, message, \
     is_resolved, resolved_at, resolved_by, resolution_notes, notified_users, \
     notification_sent_at, notification_status, created_at, updated_at";

#[derive(Debug, FromRow)]
struct AlertRow {
    id: Uuid,
    organization_id: Uuid,
    submission_id: Uuid,
    alert_type: String,
    severity: String,
    message: String,
    is_resolved: bool,
    resolved_at: Option<DateTime<Utc>>,
    resolved_by: Option<Uuid>,
    resolution_notes: Option<String>,
    notified_users: Vec<Uuid>,
    notification_sent_at: Option<DateTime<Utc>>,
    notification_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AlertRow> for Alert {
    type Error = AppError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        let resolution = match (row.is_resolved, row.resolved_at, row.resolved_by) {
            (true, Some(resolved_at), Some(resolved_by)) => Some(AlertResolution {
                resolved_at,
                resolved_by: UserId::from_uuid(resolved_by),
                notes: row.resolution_notes,
            }),
            (false, _, _) => None,
            (true, _, _) => {
                return Err(AppError::Internal(format!(
                    "alert '{}' is resolved without resolution details",
                    row.id
                )));
            }
        };

        Ok(Alert::restore(AlertSnapshot {
            id: AlertId::from_uuid(row.id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            submission_id: SubmissionId::from_uuid(row.submission_id),
            alert_type: row.alert_type.parse()?,
            severity: row.severity.parse()?,
            message: row.message,
            resolution,
            notification: AlertNotification {
                notified_users: row
                    .notified_users
                    .into_iter()
                    .map(UserId::from_uuid)
                    .collect(),
                sent_at: row.notification_sent_at,
                status: row.notification_status.parse()?,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}

#[derive(Debug, FromRow)]
struct SeverityTotalsRow {
    severity: String,
    total: i64,
    unresolved: i64,
    resolved_since: i64,
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

fn alert_uuids(alert_ids: &[AlertId]) -> Vec<Uuid> {
    alert_ids.iter().map(AlertId::as_uuid).collect()
}

#[async_trait]
impl AlertRepository for PostgresAlertRepository {
    async fn insert(&self, alert: &Alert) -> AppResult<()> {
        self.insert_impl(alert).await
    }

    async fn find_by_id(&self, alert_id: AlertId) -> AppResult<Option<Alert>> {
        self.find_by_id_impl(alert_id).await
    }

    async fn find_by_submission(&self, submission_id: SubmissionId) -> AppResult<Option<Alert>> {
        self.find_by_submission_impl(submission_id).await
    }

    async fn save_notification(
        &self,
        alert_id: AlertId,
        notification: &AlertNotification,
        updated_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.save_notification_impl(alert_id, notification, updated_at)
            .await
    }

    async fn save_resolution(
        &self,
        alert_id: AlertId,
        resolution: &AlertResolution,
    ) -> AppResult<Option<Alert>> {
        self.save_resolution_impl(alert_id, resolution).await
    }

    async fn resolve_unresolved(
        &self,
        organization_id: OrganizationId,
        alert_ids: &[AlertId],
        resolution: &AlertResolution,
    ) -> AppResult<u64> {
        self.resolve_unresolved_impl(organization_id, alert_ids, resolution)
            .await
    }

    async fn list(
        &self,
        organization_id: OrganizationId,
        query: &AlertListQuery,
    ) -> AppResult<Vec<Alert>> {
        self.list_impl(organization_id, query).await
    }

    async fn list_created_between(
        &self,
        organization_id: OrganizationId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Alert>> {
        self.list_created_between_impl(organization_id, start, end)
            .await
    }

    async fn statistics(
        &self,
        organization_id: OrganizationId,
        resolved_since: DateTime<Utc>,
    ) -> AppResult<AlertStatistics> {
        self.statistics_impl(organization_id, resolved_since).await
    }

    async fn count_unresolved_by_severity(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<SeverityCounts> {
        self.count_unresolved_by_severity_impl(organization_id)
            .await
    }
}

#[cfg(test)]
mod tests;
