use super::*;

impl AlertService {
    /// Lists every unresolved alert, most severe first.
    pub async fn find_unresolved(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<Alert>> {
        self.require_manager(actor, organization_id).await?;
        self.alerts
            .list(organization_id, &AlertListQuery::unresolved())
            .await
    }

    /// Lists a page of alerts, most severe first.
    pub async fn find_by_organization(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
        query: AlertListQuery,
    ) -> AppResult<Vec<Alert>> {
        self.require_manager(actor, organization_id).await?;
        self.alerts.list(organization_id, &query).await
    }

    /// Returns the alert raised by a submission.
    pub async fn find_by_submission(
        &self,
        actor: &UserIdentity,
        submission_id: SubmissionId,
    ) -> AppResult<Alert> {
        let alert = self
            .alerts
            .find_by_submission(submission_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("no alert was raised for submission '{submission_id}'"))
            })?;

        self.require_manager(actor, alert.organization_id()).await?;
        Ok(alert)
    }

    /// Lists alerts of one severity, resolved ones included, most recent first.
    pub async fn find_by_severity(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
        severity: AlertSeverity,
    ) -> AppResult<Vec<Alert>> {
        self.require_manager(actor, organization_id).await?;
        self.alerts
            .list(
                organization_id,
                &AlertListQuery {
                    limit: None,
                    offset: 0,
                    include_resolved: true,
                    severity: Some(severity),
                },
            )
            .await
    }

    /// Lists alerts created within the inclusive range, most recent first.
    pub async fn find_by_date_range(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Alert>> {
        if start > end {
            return Err(AppError::Validation(format!(
                "date range start '{start}' is after end '{end}'"
            )));
        }

        self.require_manager(actor, organization_id).await?;
        self.alerts
            .list_created_between(organization_id, start, end)
            .await
    }

    /// Aggregates alert figures; `resolved_today` counts from local midnight.
    pub async fn get_statistics(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
    ) -> AppResult<AlertStatistics> {
        self.require_manager(actor, organization_id).await?;
        self.alerts
            .statistics(organization_id, start_of_local_day(Local::now()))
            .await
    }

    /// Counts unresolved alerts per severity.
    pub async fn count_unresolved_by_severity(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
    ) -> AppResult<SeverityCounts> {
        self.require_manager(actor, organization_id).await?;
        self.alerts
            .count_unresolved_by_severity(organization_id)
            .await
    }
}

pub(super) fn start_of_local_day(now: DateTime<Local>) -> DateTime<Utc> {
    now.date_naive()
        .and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()
        .map_or_else(
            || now.with_timezone(&Utc),
            |midnight| midnight.with_timezone(&Utc),
        )
}
