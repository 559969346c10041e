//! Daily emotional check-in records.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use emociograma_core::{AppError, AppResult, NonEmptyString, OrganizationId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::organization::Locale;

/// Unique identifier for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    /// Creates a new random submission identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a submission identifier from an existing UUID value.
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

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SubmissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Emotion intensity on a 1–10 scale; higher values mean more distress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct EmotionLevel(u8);

impl EmotionLevel {
    /// Lowest accepted level.
    pub const MIN: u8 = 1;
    /// Highest accepted level.
    pub const MAX: u8 = 10;

    /// Creates a validated emotion level.
    pub fn new(value: u8) -> AppResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(AppError::Validation(format!(
                "emotion level must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )));
        }

        Ok(Self(value))
    }

    /// Returns the raw level.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for EmotionLevel {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmotionLevel> for u8 {
    fn from(value: EmotionLevel) -> Self {
        value.0
    }
}

impl Display for EmotionLevel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Returns a translated emotion label for an emoji, falling back to the level band.
#[must_use]
pub fn emotion_label(emoji: &str, level: EmotionLevel, locale: Locale) -> &'static str {
    let by_emoji = match (emoji.trim(), locale) {
        ("😄" | "😀" | "😁", Locale::Es) => Some("Muy feliz"),
        ("😄" | "😀" | "😁", Locale::En) => Some("Very happy"),
        ("😊" | "🙂", Locale::Es) => Some("Contento"),
        ("😊" | "🙂", Locale::En) => Some("Content"),
        ("😐", Locale::Es) => Some("Neutral"),
        ("😐", Locale::En) => Some("Neutral"),
        ("😕" | "😟", Locale::Es) => Some("Preocupado"),
        ("😕" | "😟", Locale::En) => Some("Worried"),
        ("😢" | "😞", Locale::Es) => Some("Triste"),
        ("😢" | "😞", Locale::En) => Some("Sad"),
        ("😰" | "😨", Locale::Es) => Some("Ansioso"),
        ("😰" | "😨", Locale::En) => Some("Anxious"),
        ("😫" | "😩", Locale::Es) => Some("Agotado"),
        ("😫" | "😩", Locale::En) => Some("Exhausted"),
        ("😡" | "😠", Locale::Es) => Some("Enojado"),
        ("😡" | "😠", Locale::En) => Some("Angry"),
        ("😭", Locale::Es) => Some("Desbordado"),
        ("😭", Locale::En) => Some("Overwhelmed"),
        _ => None,
    };

    by_emoji.unwrap_or(match (level.value(), locale) {
        (1..=2, Locale::Es) => "Muy bien",
        (1..=2, Locale::En) => "Very good",
        (3..=4, Locale::Es) => "Bien",
        (3..=4, Locale::En) => "Good",
        (5, Locale::Es) => "Regular",
        (5, Locale::En) => "So-so",
        (6, Locale::Es) => "Preocupado",
        (6, Locale::En) => "Worried",
        (7..=8, Locale::Es) => "Mal",
        (7..=8, Locale::En) => "Bad",
        (_, Locale::Es) => "Muy mal",
        (_, Locale::En) => "Very bad",
    })
}

/// Input payload for recording a new check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmissionInput {
    /// Emotion level on the 1–10 scale.
    pub emotion_level: u8,
    /// Emoji chosen by the user.
    pub emotion_emoji: String,
    /// Emotion category identifier.
    pub category_id: String,
    /// Explicit anonymity choice; the organization default applies when omitted.
    pub is_anonymous: Option<bool>,
    /// Optional free-text comment.
    pub comment: Option<String>,
    /// Optional department tag.
    pub department: Option<String>,
    /// Optional team tag.
    pub team: Option<String>,
}

/// Persisted submission snapshot used to restore an entity from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionSnapshot {
    /// Stable identifier.
    pub id: SubmissionId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Submitting user.
    pub user_id: UserId,
    /// Emotion level.
    pub emotion_level: u8,
    /// Emoji chosen by the user.
    pub emotion_emoji: String,
    /// Emotion category identifier.
    pub category_id: String,
    /// Anonymity flag.
    pub is_anonymous: bool,
    /// Optional comment.
    pub comment: Option<String>,
    /// Moderation flag.
    pub comment_flagged: bool,
    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,
    /// Optional department tag.
    pub department: Option<String>,
    /// Optional team tag.
    pub team: Option<String>,
}

/// One emotional check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    id: SubmissionId,
    organization_id: OrganizationId,
    user_id: UserId,
    emotion_level: EmotionLevel,
    emotion_emoji: NonEmptyString,
    category_id: NonEmptyString,
    is_anonymous: bool,
    comment: Option<String>,
    comment_flagged: bool,
    submitted_at: DateTime<Utc>,
    department: Option<String>,
    team: Option<String>,
}

impl Submission {
    /// Creates a validated submission.
    pub fn new(
        organization_id: OrganizationId,
        user_id: UserId,
        input: NewSubmissionInput,
        anonymous_by_default: bool,
    ) -> AppResult<Self> {
        let NewSubmissionInput {
            emotion_level,
            emotion_emoji,
            category_id,
            is_anonymous,
            comment,
            department,
            team,
        } = input;

        Ok(Self {
            id: SubmissionId::new(),
            organization_id,
            user_id,
            emotion_level: EmotionLevel::new(emotion_level)?,
            emotion_emoji: NonEmptyString::new(emotion_emoji.trim())?,
            category_id: NonEmptyString::new(category_id.trim())?,
            is_anonymous: is_anonymous.unwrap_or(anonymous_by_default),
            comment: normalize_optional(comment),
            comment_flagged: false,
            submitted_at: Utc::now(),
            department: normalize_optional(department),
            team: normalize_optional(team),
        })
    }

    /// Restores a submission from persisted state.
    pub fn restore(snapshot: SubmissionSnapshot) -> AppResult<Self> {
        Ok(Self {
            id: snapshot.id,
            organization_id: snapshot.organization_id,
            user_id: snapshot.user_id,
            emotion_level: EmotionLevel::new(snapshot.emotion_level)?,
            emotion_emoji: NonEmptyString::new(snapshot.emotion_emoji)?,
            category_id: NonEmptyString::new(snapshot.category_id)?,
            is_anonymous: snapshot.is_anonymous,
            comment: snapshot.comment,
            comment_flagged: snapshot.comment_flagged,
            submitted_at: snapshot.submitted_at,
            department: snapshot.department,
            team: snapshot.team,
        })
    }

    /// Returns the submission identifier.
    #[must_use]
    pub fn id(&self) -> SubmissionId {
        self.id
    }

    /// Returns the owning organization.
    #[must_use]
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the submitting user.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the submitting user unless the submission is anonymous.
    #[must_use]
    pub fn visible_user_id(&self) -> Option<UserId> {
        (!self.is_anonymous).then_some(self.user_id)
    }

    /// Returns the emotion level.
    #[must_use]
    pub fn emotion_level(&self) -> EmotionLevel {
        self.emotion_level
    }

    /// Returns the chosen emoji.
    #[must_use]
    pub fn emotion_emoji(&self) -> &str {
        self.emotion_emoji.as_str()
    }

    /// Returns the emotion category identifier.
    #[must_use]
    pub fn category_id(&self) -> &str {
        self.category_id.as_str()
    }

    /// Returns the anonymity flag.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.is_anonymous
    }

    /// Returns the comment.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns the moderation flag.
    #[must_use]
    pub fn comment_flagged(&self) -> bool {
        self.comment_flagged
    }

    /// Returns the submission timestamp.
    #[must_use]
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Returns the department tag.
    #[must_use]
    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }

    /// Returns the team tag.
    #[must_use]
    pub fn team(&self) -> Option<&str> {
        self.team.as_deref()
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
