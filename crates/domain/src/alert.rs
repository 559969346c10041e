//! Alert lifecycle: classification, notification tracking and resolution.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use emociograma_core::{AppError, AppResult, OrganizationId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::organization::Locale;
use crate::submission::{EmotionLevel, SubmissionId};

/// Unique identifier for an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(Uuid);

impl AlertId {
    /// Creates a new random alert identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an alert identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AlertId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Reason an alert was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// A single submission met the organization threshold.
    ThresholdExceeded,
    /// A sequence of submissions matched a pattern.
    PatternDetected,
}

impl AlertType {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThresholdExceeded => "threshold_exceeded",
            Self::PatternDetected => "pattern_detected",
        }
    }
}

impl FromStr for AlertType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "threshold_exceeded" => Ok(Self::ThresholdExceeded),
            "pattern_detected" => Ok(Self::PatternDetected),
            _ => Err(AppError::Validation(format!("unknown alert type '{value}'"))),
        }
    }
}

/// Fixed, level-derived alert classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// Levels 1–5, only reachable under a lowered threshold.
    Low,
    /// Level 6.
    Medium,
    /// Levels 7–8.
    High,
    /// Levels 9–10.
    Critical,
}

impl AlertSeverity {
    /// Classifies an emotion level into its fixed band.
    ///
    /// The bands are independent of the organization threshold; levels up to
    /// 5 only raise an alert (as `Low`) when an organization lowers its
    /// threshold below the default.
    #[must_use]
    pub fn for_emotion_level(level: EmotionLevel) -> Self {
        match level.value() {
            0..=5 => Self::Low,
            6 => Self::Medium,
            7..=8 => Self::High,
            _ => Self::Critical,
        }
    }

    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Listing rank; higher ranks are listed first.
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    /// Returns all severities, most severe first.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AlertSeverity] = &[
            AlertSeverity::Critical,
            AlertSeverity::High,
            AlertSeverity::Medium,
            AlertSeverity::Low,
        ];

        ALL
    }

    /// Bracketed email subject tag.
    #[must_use]
    pub fn subject_prefix(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::Critical, Locale::Es) => "[CRÍTICO]",
            (Self::Critical, Locale::En) => "[CRITICAL]",
            (Self::High, Locale::Es) => "[ALTO]",
            (Self::High, Locale::En) => "[HIGH]",
            (Self::Medium, Locale::Es) => "[MEDIO]",
            (Self::Medium, Locale::En) => "[MEDIUM]",
            (Self::Low, Locale::Es) => "[BAJO]",
            (Self::Low, Locale::En) => "[LOW]",
        }
    }
}

impl FromStr for AlertSeverity {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(AppError::Validation(format!(
                "unknown alert severity '{value}'"
            ))),
        }
    }
}

/// Outcome of the notification step for an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    /// Notification step has not run yet.
    Pending,
    /// The organization had nobody to notify.
    NoRecipients,
    /// At least one recipient was notified.
    Sent,
    /// Recipients existed but every send failed.
    Failed,
}

impl NotificationStatus {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::NoRecipients => "no_recipients",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for NotificationStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "no_recipients" => Ok(Self::NoRecipients),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            _ => Err(AppError::Validation(format!(
                "unknown notification status '{value}'"
            ))),
        }
    }
}

/// Terminal resolution details; immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertResolution {
    /// Resolution timestamp.
    pub resolved_at: DateTime<Utc>,
    /// Resolving user.
    pub resolved_by: UserId,
    /// Optional free-text notes.
    pub notes: Option<String>,
}

/// Notification tracking for an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertNotification {
    /// Users whose notification was delivered.
    pub notified_users: Vec<UserId>,
    /// Set when at least one notification was delivered.
    pub sent_at: Option<DateTime<Utc>>,
    /// Outcome of the notification step.
    pub status: NotificationStatus,
}

impl AlertNotification {
    /// Tracking state of a freshly created alert.
    #[must_use]
    pub fn pending() -> Self {
        Self {
            notified_users: Vec::new(),
            sent_at: None,
            status: NotificationStatus::Pending,
        }
    }

    /// Derives tracking state from the settled sends.
    #[must_use]
    pub fn settled(recipient_count: usize, delivered: Vec<UserId>, now: DateTime<Utc>) -> Self {
        if recipient_count == 0 {
            return Self {
                notified_users: Vec::new(),
                sent_at: None,
                status: NotificationStatus::NoRecipients,
            };
        }

        if delivered.is_empty() {
            return Self {
                notified_users: Vec::new(),
                sent_at: None,
                status: NotificationStatus::Failed,
            };
        }

        Self {
            notified_users: delivered,
            sent_at: Some(now),
            status: NotificationStatus::Sent,
        }
    }
}

/// Persisted alert snapshot used to restore an entity from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertSnapshot {
    /// Stable identifier.
    pub id: AlertId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Submission that raised the alert.
    pub submission_id: SubmissionId,
    /// Reason the alert was raised.
    pub alert_type: AlertType,
    /// Severity.
    pub severity: AlertSeverity,
    /// Human-readable message.
    pub message: String,
    /// Resolution, once resolved.
    pub resolution: Option<AlertResolution>,
    /// Notification tracking.
    pub notification: AlertNotification,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Alert raised from a submission; transitions once from unresolved to resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    id: AlertId,
    organization_id: OrganizationId,
    submission_id: SubmissionId,
    alert_type: AlertType,
    severity: AlertSeverity,
    message: String,
    resolution: Option<AlertResolution>,
    notification: AlertNotification,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Alert {
    /// Creates an unresolved alert with pending notifications.
    #[must_use]
    pub fn new(
        organization_id: OrganizationId,
        submission_id: SubmissionId,
        alert_type: AlertType,
        severity: AlertSeverity,
        message: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AlertId::new(),
            organization_id,
            submission_id,
            alert_type,
            severity,
            message,
            resolution: None,
            notification: AlertNotification::pending(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Restores an alert from persisted state.
    #[must_use]
    pub fn restore(snapshot: AlertSnapshot) -> Self {
        Self {
            id: snapshot.id,
            organization_id: snapshot.organization_id,
            submission_id: snapshot.submission_id,
            alert_type: snapshot.alert_type,
            severity: snapshot.severity,
            message: snapshot.message,
            resolution: snapshot.resolution,
            notification: snapshot.notification,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        }
    }

    /// Returns the alert identifier.
    #[must_use]
    pub fn id(&self) -> AlertId {
        self.id
    }

    /// Returns the owning organization.
    #[must_use]
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the submission that raised the alert.
    #[must_use]
    pub fn submission_id(&self) -> SubmissionId {
        self.submission_id
    }

    /// Returns the alert type.
    #[must_use]
    pub fn alert_type(&self) -> AlertType {
        self.alert_type
    }

    /// Returns the severity.
    #[must_use]
    pub fn severity(&self) -> AlertSeverity {
        self.severity
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns whether the alert was resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    /// Returns resolution details, if resolved.
    #[must_use]
    pub fn resolution(&self) -> Option<&AlertResolution> {
        self.resolution.as_ref()
    }

    /// Returns notification tracking.
    #[must_use]
    pub fn notification(&self) -> &AlertNotification {
        &self.notification
    }

    /// Returns notified users.
    #[must_use]
    pub fn notified_users(&self) -> &[UserId] {
        self.notification.notified_users.as_slice()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Resolves the alert; a resolved alert is never changed again.
    pub fn resolve(
        &mut self,
        resolved_by: UserId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<&AlertResolution> {
        if self.resolution.is_some() {
            return Err(AppError::Conflict(format!(
                "alert '{}' is already resolved",
                self.id
            )));
        }

        self.updated_at = now;
        Ok(&*self.resolution.insert(AlertResolution {
            resolved_at: now,
            resolved_by,
            notes,
        }))
    }

    /// Replaces notification tracking.
    pub fn record_notification(&mut self, notification: AlertNotification, now: DateTime<Utc>) {
        self.notification = notification;
        self.updated_at = now;
    }
}

/// Listing order: severity descending, then most recent first.
#[must_use]
pub fn compare_for_listing(left: &Alert, right: &Alert) -> Ordering {
    right
        .severity
        .rank()
        .cmp(&left.severity.rank())
        .then_with(|| right.created_at.cmp(&left.created_at))
}

/// Builds the human-readable alert message.
#[must_use]
pub fn alert_message(
    label: &str,
    level: EmotionLevel,
    team: Option<&str>,
    locale: Locale,
) -> String {
    let base = match locale {
        Locale::Es => format!("Alerta emocional: {label} (nivel {level}/10)"),
        Locale::En => format!("Emotional alert: {label} (level {level}/10)"),
    };

    match (team, locale) {
        (Some(team), Locale::Es) => format!("{base} en el equipo {team}"),
        (Some(team), Locale::En) => format!("{base} in team {team}"),
        (None, _) => base,
    }
}

/// Per-severity counters; every severity is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    /// Critical alerts.
    pub critical: u64,
    /// High alerts.
    pub high: u64,
    /// Medium alerts.
    pub medium: u64,
    /// Low alerts.
    pub low: u64,
}

impl SeverityCounts {
    /// Adds `count` alerts of one severity.
    pub fn add(&mut self, severity: AlertSeverity, count: u64) {
        let slot = match severity {
            AlertSeverity::Critical => &mut self.critical,
            AlertSeverity::High => &mut self.high,
            AlertSeverity::Medium => &mut self.medium,
            AlertSeverity::Low => &mut self.low,
        };
        *slot = slot.saturating_add(count);
    }

    /// Returns the count for one severity.
    #[must_use]
    pub fn get(&self, severity: AlertSeverity) -> u64 {
        match severity {
            AlertSeverity::Critical => self.critical,
            AlertSeverity::High => self.high,
            AlertSeverity::Medium => self.medium,
            AlertSeverity::Low => self.low,
        }
    }
}

/// Aggregated alert figures for one organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStatistics {
    /// All alerts.
    pub total: u64,
    /// All alerts by severity.
    pub by_severity: SeverityCounts,
    /// Alerts not yet resolved.
    pub unresolved: u64,
    /// Alerts resolved since local midnight.
    pub resolved_today: u64,
}
