use super::*;

impl AlertService {
    /// Raises an alert when the submission meets the organization threshold.
    ///
    /// Returns `None` below the threshold. Notification failures never fail
    /// the call; they only shrink the notified set. An alert left pending by
    /// an interrupted earlier call is notified on the next call.
    pub async fn trigger_emotional_alert(&self, submission: &Submission) -> AppResult<Option<Alert>> {
        let settings = self.settings_for(submission.organization_id()).await?;
        let level = submission.emotion_level();

        if level.value() < settings.alert_threshold {
            debug!(
                submission_id = %submission.id(),
                level = level.value(),
                threshold = settings.alert_threshold,
                "submission below alert threshold"
            );
            return Ok(None);
        }

        if let Some(existing) = self.alerts.find_by_submission(submission.id()).await? {
            return self
                .resume_notification(existing, level.value(), settings.locale)
                .await
                .map(Some);
        }

        let severity = AlertSeverity::for_emotion_level(level);
        let label = emotion_label(submission.emotion_emoji(), level, settings.locale);
        let message = alert_message(label, level, submission.team(), settings.locale);

        let alert = Alert::new(
            submission.organization_id(),
            submission.id(),
            AlertType::ThresholdExceeded,
            severity,
            message,
        );

        if let Err(error) = self.alerts.insert(&alert).await {
            let AppError::Conflict(_) = error else {
                return Err(error);
            };
            return match self.alerts.find_by_submission(submission.id()).await? {
                Some(existing) => self
                    .resume_notification(existing, level.value(), settings.locale)
                    .await
                    .map(Some),
                None => Ok(None),
            };
        }

        info!(
            alert_id = %alert.id(),
            organization_id = %alert.organization_id(),
            severity = severity.as_str(),
            "alert raised"
        );

        self.complete_notification(alert, level.value(), settings.locale)
            .await
            .map(Some)
    }

    async fn resume_notification(
        &self,
        alert: Alert,
        level: u8,
        locale: Locale,
    ) -> AppResult<Alert> {
        if alert.notification().status != NotificationStatus::Pending {
            return Ok(alert);
        }

        debug!(alert_id = %alert.id(), "resuming pending alert notification");
        self.complete_notification(alert, level, locale).await
    }

    async fn complete_notification(
        &self,
        mut alert: Alert,
        level: u8,
        locale: Locale,
    ) -> AppResult<Alert> {
        let managers = self
            .roles
            .list_organization_managers(alert.organization_id())
            .await?;
        if managers.is_empty() {
            debug!(alert_id = %alert.id(), "no managers to notify");
        }

        let notification = self.notify_managers(&alert, level, locale, &managers).await;
        let settled_at = notification.sent_at.unwrap_or_else(Utc::now);
        info!(
            alert_id = %alert.id(),
            status = notification.status.as_str(),
            notified = notification.notified_users.len(),
            recipients = managers.len(),
            "alert notifications settled"
        );
        self.alerts
            .save_notification(alert.id(), &notification, settled_at)
            .await?;
        alert.record_notification(notification, settled_at);

        Ok(alert)
    }
}
