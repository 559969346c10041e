//! Application services and ports.

#![forbid(unsafe_code)]

mod alert_ports;
mod alert_service;
mod authorization_service;
mod export_ports;
mod export_service;
mod organization_ports;
mod organization_service;
mod retention_service;
mod role_admin_service;
mod role_ports;
mod role_service;
mod submission_ports;
mod submission_service;

#[cfg(test)]
mod test_support;

pub use alert_ports::{AlertListQuery, AlertRepository, EmailMessage, EmailService, SentEmail};
pub use alert_service::AlertService;
pub use authorization_service::AuthorizationService;
pub use export_ports::{ExportDocument, ExportFormat, ExportRenderer, ExportTable};
pub use export_service::{AlertExportFilter, ExportService, SubmissionExportFilter};
pub use organization_ports::OrganizationRepository;
pub use organization_service::OrganizationService;
pub use retention_service::{RetentionService, RetentionSweepEntry};
pub use role_admin_service::RoleAdministrationService;
pub use role_ports::{AssignRoleInput, ManagerContact, RoleRepository};
pub use role_service::RoleDirectoryService;
pub use submission_ports::{SubmissionListQuery, SubmissionRepository};
pub use submission_service::{SubmissionReceipt, SubmissionService, SubmissionView};
