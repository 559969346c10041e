use super::*;

impl AlertService {
    /// Sends one email per manager concurrently and settles once all sends finish.
    pub(super) async fn notify_managers(
        &self,
        alert: &Alert,
        level: u8,
        locale: Locale,
        managers: &[ManagerContact],
    ) -> AlertNotification {
        let sends = managers.iter().map(|manager| {
            let message = render_alert_email(alert, level, locale, manager);
            async move { (manager, self.email.send(message).await) }
        });

        let mut delivered = Vec::with_capacity(managers.len());
        for (manager, outcome) in join_all(sends).await {
            match outcome {
                Ok(sent) => {
                    debug!(
                        alert_id = %alert.id(),
                        user_id = %manager.user_id,
                        message_id = %sent.id,
                        "alert notification delivered"
                    );
                    delivered.push(manager.user_id);
                }
                Err(error) => {
                    warn!(
                        alert_id = %alert.id(),
                        user_id = %manager.user_id,
                        error = %error,
                        "alert notification failed"
                    );
                }
            }
        }

        AlertNotification::settled(managers.len(), delivered, Utc::now())
    }
}

pub(super) fn render_alert_email(
    alert: &Alert,
    level: u8,
    locale: Locale,
    manager: &ManagerContact,
) -> EmailMessage {
    let severity = alert.severity();
    let (title, greeting, severity_label, level_label, footer) = match locale {
        Locale::Es => (
            "Alerta emocional en tu organización",
            "Hola",
            "Severidad",
            "Nivel",
            "Revisa la alerta en el panel para darle seguimiento.",
        ),
        Locale::En => (
            "Emotional alert in your organization",
            "Hello",
            "Severity",
            "Level",
            "Review the alert in the dashboard to follow up.",
        ),
    };

    let subject = format!("{} {title}", severity.subject_prefix(locale));
    let text_body = format!(
        "{greeting} {name},\n\n{message}\n\n{severity_label}: {severity}\n{level_label}: \
         {level}/10\n\n{footer}\n",
        name = manager.display_name,
        message = alert.message(),
        severity = severity.as_str(),
    );
    let html_body = format!(
        "<p>{greeting} {name},</p>\
         <p>{message}</p>\
         <ul><li><strong>{severity_label}:</strong> {severity}</li>\
         <li><strong>{level_label}:</strong> {level}/10</li></ul>\
         <p>{footer}</p>",
        name = escape_html(&manager.display_name),
        message = escape_html(alert.message()),
        severity = severity.as_str(),
    );

    EmailMessage {
        to: manager.email.clone(),
        subject,
        html_body,
        text_body,
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
