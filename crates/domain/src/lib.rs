//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod alert;
mod organization;
mod role;
mod submission;

pub use alert::{
    Alert, AlertId, AlertNotification, AlertResolution, AlertSeverity, AlertSnapshot,
    AlertStatistics, AlertType, NotificationStatus, SeverityCounts, alert_message,
    compare_for_listing,
};
pub use organization::{
    DEFAULT_ALERT_THRESHOLD, DEFAULT_DATA_RETENTION_DAYS, Locale, NewOrganizationInput,
    ORGANIZATION_NAME_MAX_LENGTH, ORGANIZATION_NAME_MIN_LENGTH, Organization,
    OrganizationSettings, OrganizationSnapshot, OrganizationType, slugify,
};
pub use role::{Role, RoleAssignment, RoleId, Scope, SystemRole};
pub use submission::{
    EmotionLevel, NewSubmissionInput, Submission, SubmissionId, SubmissionSnapshot,
    emotion_label,
};
