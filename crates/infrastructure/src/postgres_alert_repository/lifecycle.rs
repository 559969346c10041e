use super::*;

impl PostgresAlertRepository {
    pub(super) async fn insert_impl(&self, alert: &Alert) -> AppResult<()> {
        let mut transaction =
            begin_organization_scope(&self.pool, alert.organization_id()).await?;
        let notification = alert.notification();
        let resolution = alert.resolution();

        let result = sqlx::query(
            r#"
            INSERT INTO emociograma_alerts (
                id, organization_id, submission_id, alert_type, severity, message,
                is_resolved, resolved_at, resolved_by, resolution_notes,
                notified_users, notification_sent_at, notification_status,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(alert.id().as_uuid())
        .bind(alert.organization_id().as_uuid())
        .bind(alert.submission_id().as_uuid())
        .bind(alert.alert_type().as_str())
        .bind(alert.severity().as_str())
        .bind(alert.message())
        .bind(alert.is_resolved())
        .bind(resolution.map(|resolution| resolution.resolved_at))
        .bind(resolution.map(|resolution| resolution.resolved_by.as_uuid()))
        .bind(resolution.and_then(|resolution| resolution.notes.clone()))
        .bind(
            notification
                .notified_users
                .iter()
                .map(UserId::as_uuid)
                .collect::<Vec<_>>(),
        )
        .bind(notification.sent_at)
        .bind(notification.status.as_str())
        .bind(alert.created_at())
        .bind(alert.updated_at())
        .execute(&mut *transaction)
        .await;

        match result {
            Ok(_) => commit(transaction).await,
            Err(error) if is_unique_violation(&error) => Err(AppError::Conflict(format!(
                "submission '{}' already raised an alert",
                alert.submission_id()
            ))),
            Err(error) => Err(AppError::Internal(format!("failed to insert alert: {error}"))),
        }
    }

    pub(super) async fn find_by_id_impl(&self, alert_id: AlertId) -> AppResult<Option<Alert>> {
        let query = format!("SELECT {ALERT_COLUMNS} FROM emociograma_alerts WHERE id = $1");
        let row = sqlx::query_as::<_, AlertRow>(query.as_str())
            .bind(alert_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to find alert '{alert_id}': {error}"))
            })?;

        row.map(Alert::try_from).transpose()
    }

    pub(super) async fn find_by_submission_impl(
        &self,
        submission_id: SubmissionId,
    ) -> AppResult<Option<Alert>> {
        let query =
            format!("SELECT {ALERT_COLUMNS} FROM emociograma_alerts WHERE submission_id = $1");
        let row = sqlx::query_as::<_, AlertRow>(query.as_str())
            .bind(submission_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to find alert for submission '{submission_id}': {error}"
                ))
            })?;

        row.map(Alert::try_from).transpose()
    }

    pub(super) async fn save_notification_impl(
        &self,
        alert_id: AlertId,
        notification: &AlertNotification,
        updated_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE emociograma_alerts
            SET notified_users = $2,
                notification_sent_at = $3,
                notification_status = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(alert_id.as_uuid())
        .bind(
            notification
                .notified_users
                .iter()
                .map(UserId::as_uuid)
                .collect::<Vec<_>>(),
        )
        .bind(notification.sent_at)
        .bind(notification.status.as_str())
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to save notification for alert '{alert_id}': {error}"
            ))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "alert '{alert_id}' was not found"
            )));
        }

        Ok(())
    }

    pub(super) async fn save_resolution_impl(
        &self,
        alert_id: AlertId,
        resolution: &AlertResolution,
    ) -> AppResult<Option<Alert>> {
        let query = format!(
            "UPDATE emociograma_alerts \
             SET is_resolved = TRUE, resolved_at = $2, resolved_by = $3, \
                 resolution_notes = $4, updated_at = $2 \
             WHERE id = $1 AND NOT is_resolved \
             RETURNING {ALERT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AlertRow>(query.as_str())
            .bind(alert_id.as_uuid())
            .bind(resolution.resolved_at)
            .bind(resolution.resolved_by.as_uuid())
            .bind(resolution.notes.as_deref())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to resolve alert '{alert_id}': {error}"))
            })?;

        row.map(Alert::try_from).transpose()
    }

    pub(super) async fn resolve_unresolved_impl(
        &self,
        organization_id: OrganizationId,
        alert_ids: &[AlertId],
        resolution: &AlertResolution,
    ) -> AppResult<u64> {
        let mut transaction = begin_organization_scope(&self.pool, organization_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE emociograma_alerts
            SET is_resolved = TRUE,
                resolved_at = $3,
                resolved_by = $4,
                resolution_notes = $5,
                updated_at = $3
            WHERE organization_id = $1
              AND id = ANY($2)
              AND NOT is_resolved
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(alert_uuids(alert_ids))
        .bind(resolution.resolved_at)
        .bind(resolution.resolved_by.as_uuid())
        .bind(resolution.notes.as_deref())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bulk resolve alerts: {error}")))?;

        commit(transaction).await?;

        Ok(result.rows_affected())
    }
}
