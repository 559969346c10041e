//! Organization hierarchy entities and per-organization settings.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use emociograma_core::{AppError, AppResult, NonEmptyString, OrganizationId};
use serde::{Deserialize, Serialize};

/// Minimum accepted organization name length in characters.
pub const ORGANIZATION_NAME_MIN_LENGTH: usize = 3;

/// Maximum accepted organization name length in characters.
pub const ORGANIZATION_NAME_MAX_LENGTH: usize = 100;

/// Threshold applied when an organization has not configured one.
pub const DEFAULT_ALERT_THRESHOLD: u8 = 6;

/// Retention window applied when an organization has not configured one.
pub const DEFAULT_DATA_RETENTION_DAYS: u16 = 365;

const MAX_DATA_RETENTION_DAYS: u16 = 3650;

/// Kind of node in the organization hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationType {
    /// Top-level legal entity.
    Company,
    /// Department within a company.
    Department,
    /// Team within a department.
    Team,
}

impl OrganizationType {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Department => "department",
            Self::Team => "team",
        }
    }
}

impl FromStr for OrganizationType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "company" => Ok(Self::Company),
            "department" => Ok(Self::Department),
            "team" => Ok(Self::Team),
            _ => Err(AppError::Validation(format!(
                "unknown organization type '{value}'"
            ))),
        }
    }
}

/// Language used for user-facing alert text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Spanish.
    #[default]
    Es,
    /// English.
    En,
}

impl Locale {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
        }
    }
}

impl FromStr for Locale {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "es" => Ok(Self::Es),
            "en" => Ok(Self::En),
            _ => Err(AppError::Validation(format!("unsupported locale '{value}'"))),
        }
    }
}

/// Per-organization configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrganizationSettings {
    /// Minimum emotion level that raises an alert.
    pub alert_threshold: u8,
    /// Days a submission is kept before the retention sweep purges it.
    pub data_retention_days: u16,
    /// Language for alert messages and notifications.
    pub locale: Locale,
    /// IANA timezone name used for reporting.
    pub timezone: String,
    /// Whether submissions are anonymous unless the user opts out.
    pub anonymous_by_default: bool,
    /// Whether the daily check-in is enabled.
    pub emociograma_enabled: bool,
}

impl Default for OrganizationSettings {
    fn default() -> Self {
        Self {
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            data_retention_days: DEFAULT_DATA_RETENTION_DAYS,
            locale: Locale::Es,
            timezone: "UTC".to_owned(),
            anonymous_by_default: false,
            emociograma_enabled: true,
        }
    }
}

impl OrganizationSettings {
    /// Validates setting bounds.
    pub fn validate(&self) -> AppResult<()> {
        if !(1..=10).contains(&self.alert_threshold) {
            return Err(AppError::Validation(format!(
                "alert threshold must be between 1 and 10, got {}",
                self.alert_threshold
            )));
        }

        if !(1..=MAX_DATA_RETENTION_DAYS).contains(&self.data_retention_days) {
            return Err(AppError::Validation(format!(
                "data retention days must be between 1 and {MAX_DATA_RETENTION_DAYS}, got {}",
                self.data_retention_days
            )));
        }

        if self.timezone.trim().is_empty() {
            return Err(AppError::Validation(
                "timezone must not be empty".to_owned(),
            ));
        }

        Ok(())
    }
}

/// Input payload used to construct a new organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrganizationInput {
    /// Display name; the slug is derived from it.
    pub name: String,
    /// Hierarchy node kind.
    pub organization_type: OrganizationType,
    /// Optional parent organization.
    pub parent_id: Option<OrganizationId>,
    /// Optional settings; defaults apply when omitted.
    pub settings: Option<OrganizationSettings>,
}

/// Persisted organization snapshot used to restore an entity from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationSnapshot {
    /// Stable identifier.
    pub id: OrganizationId,
    /// Display name.
    pub name: String,
    /// Unique URL-safe slug.
    pub slug: String,
    /// Hierarchy node kind.
    pub organization_type: OrganizationType,
    /// Parent organization.
    pub parent_id: Option<OrganizationId>,
    /// Per-organization configuration.
    pub settings: OrganizationSettings,
    /// Active flag.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Tenant-scoping organization node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    id: OrganizationId,
    name: NonEmptyString,
    slug: String,
    organization_type: OrganizationType,
    parent_id: Option<OrganizationId>,
    settings: OrganizationSettings,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl Organization {
    /// Creates a validated organization with a derived slug.
    pub fn new(input: NewOrganizationInput) -> AppResult<Self> {
        let NewOrganizationInput {
            name,
            organization_type,
            parent_id,
            settings,
        } = input;

        let name = name.trim().to_owned();
        let name_length = name.chars().count();
        if !(ORGANIZATION_NAME_MIN_LENGTH..=ORGANIZATION_NAME_MAX_LENGTH).contains(&name_length) {
            return Err(AppError::Validation(format!(
                "organization name must be between {ORGANIZATION_NAME_MIN_LENGTH} and \
                 {ORGANIZATION_NAME_MAX_LENGTH} characters"
            )));
        }

        let slug = slugify(name.as_str());
        if slug.is_empty() {
            return Err(AppError::Validation(format!(
                "organization name '{name}' does not produce a usable slug"
            )));
        }

        let settings = settings.unwrap_or_default();
        settings.validate()?;

        let now = Utc::now();
        Ok(Self {
            id: OrganizationId::new(),
            name: NonEmptyString::new(name)?,
            slug,
            organization_type,
            parent_id,
            settings,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    /// Restores an organization from persisted state.
    pub fn restore(snapshot: OrganizationSnapshot) -> AppResult<Self> {
        snapshot.settings.validate()?;

        Ok(Self {
            id: snapshot.id,
            name: NonEmptyString::new(snapshot.name)?,
            slug: snapshot.slug,
            organization_type: snapshot.organization_type,
            parent_id: snapshot.parent_id,
            settings: snapshot.settings,
            is_active: snapshot.is_active,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            deleted_at: snapshot.deleted_at,
        })
    }

    /// Returns the organization identifier.
    #[must_use]
    pub fn id(&self) -> OrganizationId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the URL-safe slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.slug.as_str()
    }

    /// Returns the hierarchy node kind.
    #[must_use]
    pub fn organization_type(&self) -> OrganizationType {
        self.organization_type
    }

    /// Returns the parent organization, if any.
    #[must_use]
    pub fn parent_id(&self) -> Option<OrganizationId> {
        self.parent_id
    }

    /// Returns organization settings.
    #[must_use]
    pub fn settings(&self) -> &OrganizationSettings {
        &self.settings
    }

    /// Returns the active flag.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns whether the organization was soft deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns whether the organization accepts new activity.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        self.is_active && self.deleted_at.is_none()
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

    /// Returns the soft delete timestamp.
    #[must_use]
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Replaces settings after validating their bounds.
    pub fn update_settings(&mut self, settings: OrganizationSettings) -> AppResult<()> {
        settings.validate()?;
        self.settings = settings;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Marks the organization as inactive and soft deleted.
    pub fn deactivate(&mut self) -> AppResult<()> {
        if self.deleted_at.is_some() {
            return Err(AppError::Conflict(format!(
                "organization '{}' is already deactivated",
                self.id
            )));
        }

        let now = Utc::now();
        self.is_active = false;
        self.deleted_at = Some(now);
        self.updated_at = now;
        Ok(())
    }
}

/// Derives a lower-case ASCII slug with single `-` separators.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for character in name.chars().flat_map(char::to_lowercase) {
        let folded = match character {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        };

        if folded.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(folded);
        } else if folded.is_whitespace() || folded == '-' || folded == '_' {
            pending_separator = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::{
        NewOrganizationInput, Organization, OrganizationSettings, OrganizationType, slugify,
    };

    fn input(name: &str) -> NewOrganizationInput {
        NewOrganizationInput {
            name: name.to_owned(),
            organization_type: OrganizationType::Company,
            parent_id: None,
            settings: None,
        }
    }

    #[test]
    fn slug_is_derived_from_name() {
        assert_eq!(slugify("  Acme   Recursos Humanos "), "acme-recursos-humanos");
        assert_eq!(slugify("Diseño & Tecnología"), "diseno-tecnologia");
        assert_eq!(slugify("team_one--two"), "team-one-two");
    }

    #[test]
    fn organization_name_length_is_enforced() {
        assert!(Organization::new(input("ab")).is_err());
        assert!(Organization::new(input(&"x".repeat(101))).is_err());
        assert!(Organization::new(input("Acme")).is_ok());
    }

    #[test]
    fn organization_without_slug_characters_is_rejected() {
        assert!(Organization::new(input("!!!!")).is_err());
    }

    #[test]
    fn settings_bounds_are_validated() {
        let mut settings = OrganizationSettings {
            alert_threshold: 0,
            ..OrganizationSettings::default()
        };
        assert!(settings.validate().is_err());

        settings.alert_threshold = 11;
        assert!(settings.validate().is_err());

        settings.alert_threshold = 7;
        settings.data_retention_days = 3651;
        assert!(settings.validate().is_err());

        settings.data_retention_days = 30;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn missing_settings_fields_use_defaults() {
        let settings = OrganizationSettings::default();
        assert_eq!(settings.alert_threshold, 6);
        assert_eq!(settings.data_retention_days, 365);
        assert!(settings.emociograma_enabled);
    }

    #[test]
    fn deactivation_happens_once() {
        let organization = Organization::new(input("Acme"));
        assert!(organization.is_ok());
        let mut organization = organization.unwrap_or_else(|_| unreachable!());

        assert!(organization.deactivate().is_ok());
        assert!(!organization.is_operational());
        assert!(organization.deactivate().is_err());
    }
}
