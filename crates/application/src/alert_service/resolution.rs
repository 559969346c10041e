use super::*;

impl AlertService {
    /// Resolves one alert on behalf of a manager of its organization.
    pub async fn resolve_alert(
        &self,
        actor: &UserIdentity,
        alert_id: AlertId,
        notes: Option<String>,
    ) -> AppResult<Alert> {
        let mut alert = self
            .alerts
            .find_by_id(alert_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("alert '{alert_id}' was not found")))?;

        self.require_manager(actor, alert.organization_id()).await?;

        let resolution = alert
            .resolve(actor.user_id(), normalize_notes(notes), Utc::now())?
            .clone();

        let resolved = self
            .alerts
            .save_resolution(alert_id, &resolution)
            .await?
            .ok_or_else(|| AppError::Conflict(format!("alert '{alert_id}' is already resolved")))?;

        info!(
            alert_id = %alert_id,
            resolved_by = %actor.user_id(),
            "alert resolved"
        );

        Ok(resolved)
    }

    /// Resolves the currently unresolved subset of `alert_ids`.
    ///
    /// Already resolved ids are skipped; returns the number changed.
    pub async fn bulk_resolve(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
        alert_ids: &[AlertId],
        notes: Option<String>,
    ) -> AppResult<u64> {
        if alert_ids.is_empty() {
            return Ok(0);
        }

        self.require_manager(actor, organization_id).await?;

        let resolution = AlertResolution {
            resolved_at: Utc::now(),
            resolved_by: actor.user_id(),
            notes: normalize_notes(notes),
        };
        let resolved = self
            .alerts
            .resolve_unresolved(organization_id, alert_ids, &resolution)
            .await?;

        info!(
            organization_id = %organization_id,
            requested = alert_ids.len(),
            resolved,
            "alerts bulk resolved"
        );

        Ok(resolved)
    }
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
