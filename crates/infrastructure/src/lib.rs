//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_email_service;
mod file_export_renderer;
mod organization_scope;
mod postgres_alert_repository;
mod postgres_organization_repository;
mod postgres_role_repository;
mod postgres_submission_repository;
mod smtp_email_service;

pub use console_email_service::ConsoleEmailService;
pub use file_export_renderer::FileExportRenderer;
pub use organization_scope::{ORGANIZATION_SETTING, begin_organization_scope, commit};
pub use postgres_alert_repository::PostgresAlertRepository;
pub use postgres_organization_repository::PostgresOrganizationRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use postgres_submission_repository::PostgresSubmissionRepository;
pub use smtp_email_service::{SmtpEmailConfig, SmtpEmailService};
