//! Email delivery that only writes to the tracing output.

use async_trait::async_trait;
use emociograma_application::{EmailMessage, EmailService, SentEmail};
use emociograma_core::AppResult;
use tracing::info;
use uuid::Uuid;

/// Development email service; every message is logged and reported as delivered.
#[derive(Clone, Default)]
pub struct ConsoleEmailService;

impl ConsoleEmailService {
    /// Creates a new console email service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send(&self, message: EmailMessage) -> AppResult<SentEmail> {
        let id = format!("console-{}", Uuid::new_v4());

        info!(
            email_id = %id,
            to = %message.to,
            subject = %message.subject,
            "alert email (console)\n{}",
            message.text_body
        );

        Ok(SentEmail { id })
    }
}
