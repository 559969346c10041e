//! Alert email delivery over SMTP via `lettre`.

use async_trait::async_trait;
use emociograma_application::{EmailMessage, EmailService, SentEmail};
use emociograma_core::{AppError, AppResult};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;
use uuid::Uuid;

/// Port used for implicit TLS; every other port negotiates STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

/// SMTP connection settings.
#[derive(Clone)]
pub struct SmtpEmailConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login user.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Sender mailbox, e.g. `Emociograma <alertas@example.com>`.
    pub from_address: String,
}

/// Sends multipart (plain text and HTML) alert emails through one pooled transport.
#[derive(Clone)]
pub struct SmtpEmailService {
    from: Mailbox,
    message_id_domain: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailService {
    /// Builds the transport and validates the sender address.
    pub fn new(config: SmtpEmailConfig) -> AppResult<Self> {
        let from: Mailbox = config.from_address.parse().map_err(|error| {
            AppError::Validation(format!(
                "invalid sender address '{}': {error}",
                config.from_address
            ))
        })?;
        let message_id_domain = from.email.domain().to_owned();

        let builder = if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(config.host.as_str())
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(config.host.as_str())
        }
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to create SMTP transport for '{}': {error}",
                config.host
            ))
        })?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(config.username, config.password))
            .build();

        Ok(Self {
            from,
            message_id_domain,
            transport,
        })
    }

    fn build_message(&self, message: EmailMessage) -> AppResult<(String, Message)> {
        let recipient: Mailbox = message.to.parse().map_err(|error| {
            AppError::Validation(format!("invalid recipient address '{}': {error}", message.to))
        })?;
        let message_id = format!("<{}@{}>", Uuid::new_v4(), self.message_id_domain);

        let email = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(message.subject)
            .message_id(Some(message_id.clone()))
            .multipart(MultiPart::alternative_plain_html(
                message.text_body,
                message.html_body,
            ))
            .map_err(|error| AppError::Internal(format!("failed to build email: {error}")))?;

        Ok((message_id, email))
    }
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send(&self, message: EmailMessage) -> AppResult<SentEmail> {
        let (id, email) = self.build_message(message)?;

        let response = self
            .transport
            .send(email)
            .await
            .map_err(|error| AppError::Internal(format!("failed to send email: {error}")))?;
        debug!(email_id = %id, code = %response.code(), "smtp accepted alert email");

        Ok(SentEmail { id })
    }
}
