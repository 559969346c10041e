use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;

use emociograma_core::{AppResult, OrganizationId, UserIdentity};
use emociograma_domain::{
    Alert, AlertSeverity, Locale, Scope, Submission, SystemRole, emotion_label,
};

use crate::alert_ports::{AlertListQuery, AlertRepository};
use crate::authorization_service::AuthorizationService;
use crate::export_ports::{ExportDocument, ExportFormat, ExportRenderer, ExportTable};
use crate::organization_ports::OrganizationRepository;
use crate::submission_ports::{SubmissionListQuery, SubmissionRepository};

const ALERT_COLUMNS: [&str; 10] = [
    "id",
    "submission_id",
    "alert_type",
    "severity",
    "message",
    "is_resolved",
    "resolved_at",
    "resolution_notes",
    "notified_users",
    "created_at",
];

const SUBMISSION_COLUMNS: [&str; 10] = [
    "id",
    "user_id",
    "emotion_level",
    "emotion_label",
    "emotion_emoji",
    "category_id",
    "comment",
    "department",
    "team",
    "submitted_at",
];

/// Filter applied to alert exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertExportFilter {
    /// Whether resolved alerts are exported.
    pub include_resolved: bool,
    /// Optional exact severity filter.
    pub severity: Option<AlertSeverity>,
}

/// Inclusive submission time window for exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionExportFilter {
    /// Lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Upper bound.
    pub to: Option<DateTime<Utc>>,
}

/// Application service producing downloadable reports.
#[derive(Clone)]
pub struct ExportService {
    alerts: Arc<dyn AlertRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    authorization: AuthorizationService,
    renderer: Arc<dyn ExportRenderer>,
}

impl ExportService {
    /// Creates a new export service.
    #[must_use]
    pub fn new(
        alerts: Arc<dyn AlertRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        authorization: AuthorizationService,
        renderer: Arc<dyn ExportRenderer>,
    ) -> Self {
        Self {
            alerts,
            submissions,
            organizations,
            authorization,
            renderer,
        }
    }

    /// Exports organization alerts, most severe first.
    pub async fn export_alerts(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
        format: ExportFormat,
        filter: AlertExportFilter,
    ) -> AppResult<ExportDocument> {
        self.require_manager(actor, organization_id).await?;

        let alerts = self
            .alerts
            .list(
                organization_id,
                &AlertListQuery {
                    limit: None,
                    offset: 0,
                    include_resolved: filter.include_resolved,
                    severity: filter.severity,
                },
            )
            .await?;

        let table = ExportTable {
            columns: ALERT_COLUMNS.to_vec(),
            rows: alerts.iter().map(alert_row).collect(),
        };

        self.render(organization_id, "alerts", format, &table).await
    }

    /// Exports organization submissions without anonymous authors.
    pub async fn export_submissions(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
        format: ExportFormat,
        filter: SubmissionExportFilter,
    ) -> AppResult<ExportDocument> {
        self.require_manager(actor, organization_id).await?;

        let organization = self.organizations.find_by_id(organization_id).await?;
        let locale = organization
            .as_ref()
            .map(|organization| organization.settings().locale)
            .unwrap_or_default();

        let submissions = self
            .submissions
            .list_by_organization(
                organization_id,
                &SubmissionListQuery {
                    limit: None,
                    offset: 0,
                    from: filter.from,
                    to: filter.to,
                },
            )
            .await?;

        let table = ExportTable {
            columns: SUBMISSION_COLUMNS.to_vec(),
            rows: submissions
                .iter()
                .map(|submission| submission_row(submission, locale))
                .collect(),
        };

        self.render(organization_id, "submissions", format, &table)
            .await
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

    async fn render(
        &self,
        organization_id: OrganizationId,
        kind: &str,
        format: ExportFormat,
        table: &ExportTable,
    ) -> AppResult<ExportDocument> {
        let bytes = self.renderer.render(format, table)?;
        let label = self
            .organizations
            .find_by_id(organization_id)
            .await?
            .map_or_else(
                || organization_id.to_string(),
                |organization| organization.slug().to_owned(),
            );
        let file_name = format!(
            "{kind}-{label}-{}.{}",
            Utc::now().format("%Y%m%d"),
            format.extension()
        );

        info!(
            organization_id = %organization_id,
            kind,
            rows = table.rows.len(),
            bytes = bytes.len(),
            "export rendered"
        );

        Ok(ExportDocument {
            file_name,
            content_type: format.content_type(),
            bytes,
        })
    }
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn alert_row(alert: &Alert) -> Vec<String> {
    let resolution = alert.resolution();
    vec![
        alert.id().to_string(),
        alert.submission_id().to_string(),
        alert.alert_type().as_str().to_owned(),
        alert.severity().as_str().to_owned(),
        alert.message().to_owned(),
        alert.is_resolved().to_string(),
        resolution
            .map(|resolution| timestamp(resolution.resolved_at))
            .unwrap_or_default(),
        resolution
            .and_then(|resolution| resolution.notes.clone())
            .unwrap_or_default(),
        alert
            .notified_users()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" "),
        timestamp(alert.created_at()),
    ]
}

fn submission_row(submission: &Submission, locale: Locale) -> Vec<String> {
    vec![
        submission.id().to_string(),
        submission
            .visible_user_id()
            .map(|user_id| user_id.to_string())
            .unwrap_or_default(),
        submission.emotion_level().to_string(),
        emotion_label(
            submission.emotion_emoji(),
            submission.emotion_level(),
            locale,
        )
        .to_owned(),
        submission.emotion_emoji().to_owned(),
        submission.category_id().to_owned(),
        submission.comment().unwrap_or_default().to_owned(),
        submission.department().unwrap_or_default().to_owned(),
        submission.team().unwrap_or_default().to_owned(),
        timestamp(submission.submitted_at()),
    ]
}
