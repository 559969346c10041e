use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use emociograma_core::{AppError, AppResult, OrganizationId, UserId, UserIdentity};
use emociograma_domain::{
    Alert, Locale, NewSubmissionInput, Organization, Scope, Submission, SubmissionId, SystemRole,
    emotion_label,
};

use crate::alert_service::AlertService;
use crate::authorization_service::AuthorizationService;
use crate::organization_ports::OrganizationRepository;
use crate::submission_ports::{SubmissionListQuery, SubmissionRepository};

/// Result of recording a check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Persisted submission.
    pub submission: Submission,
    /// Alert raised by the submission, if it met the threshold.
    pub alert: Option<Alert>,
}

/// Read model of a submission with the author masked when anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionView {
    /// Submission identifier.
    pub id: SubmissionId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Author, hidden for anonymous submissions.
    pub user_id: Option<UserId>,
    /// Emotion level on the 1–10 scale.
    pub emotion_level: u8,
    /// Chosen emoji.
    pub emotion_emoji: String,
    /// Translated emotion label.
    pub emotion_label: &'static str,
    /// Check-in category.
    pub category_id: String,
    /// Anonymity flag.
    pub is_anonymous: bool,
    /// Optional comment.
    pub comment: Option<String>,
    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,
    /// Department tag.
    pub department: Option<String>,
    /// Team tag.
    pub team: Option<String>,
}

impl SubmissionView {
    /// Builds the masked view of a submission.
    #[must_use]
    pub fn from_submission(submission: &Submission, locale: Locale) -> Self {
        Self {
            id: submission.id(),
            organization_id: submission.organization_id(),
            user_id: submission.visible_user_id(),
            emotion_level: submission.emotion_level().value(),
            emotion_emoji: submission.emotion_emoji().to_owned(),
            emotion_label: emotion_label(
                submission.emotion_emoji(),
                submission.emotion_level(),
                locale,
            ),
            category_id: submission.category_id().to_owned(),
            is_anonymous: submission.is_anonymous(),
            comment: submission.comment().map(str::to_owned),
            submitted_at: submission.submitted_at(),
            department: submission.department().map(str::to_owned),
            team: submission.team().map(str::to_owned),
        }
    }
}

/// Application service for check-in intake and review.
#[derive(Clone)]
pub struct SubmissionService {
    submissions: Arc<dyn SubmissionRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    alerts: AlertService,
    authorization: AuthorizationService,
}

impl SubmissionService {
    /// Creates a new submission service.
    #[must_use]
    pub fn new(
        submissions: Arc<dyn SubmissionRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        alerts: AlertService,
        authorization: AuthorizationService,
    ) -> Self {
        Self {
            submissions,
            organizations,
            alerts,
            authorization,
        }
    }

    /// Records a check-in and evaluates it for an alert in the same call.
    pub async fn submit(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
        input: NewSubmissionInput,
    ) -> AppResult<SubmissionReceipt> {
        self.authorization
            .require_role(
                actor,
                Scope::Organization(organization_id),
                SystemRole::Contributor,
            )
            .await?;

        let organization = self.operational_organization(organization_id).await?;
        if !organization.settings().emociograma_enabled {
            return Err(AppError::Validation(format!(
                "check-ins are disabled for organization '{organization_id}'"
            )));
        }

        let submission = Submission::new(
            organization_id,
            actor.user_id(),
            input,
            organization.settings().anonymous_by_default,
        )?;
        self.submissions.insert(&submission).await?;

        info!(
            submission_id = %submission.id(),
            organization_id = %organization_id,
            level = submission.emotion_level().value(),
            "submission recorded"
        );

        let alert = self.alerts.trigger_emotional_alert(&submission).await?;

        Ok(SubmissionReceipt { submission, alert })
    }

    /// Lists organization submissions for managers, most recent first.
    pub async fn list_submissions(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
        query: SubmissionListQuery,
    ) -> AppResult<Vec<SubmissionView>> {
        self.authorization
            .require_role(
                actor,
                Scope::Organization(organization_id),
                SystemRole::Manager,
            )
            .await?;

        let locale = self.locale_for(organization_id).await?;
        Ok(self
            .submissions
            .list_by_organization(organization_id, &query)
            .await?
            .iter()
            .map(|submission| SubmissionView::from_submission(submission, locale))
            .collect())
    }

    /// Returns one submission to its author or to a manager of its organization.
    pub async fn find_by_id(
        &self,
        actor: &UserIdentity,
        submission_id: SubmissionId,
    ) -> AppResult<SubmissionView> {
        let submission = self
            .submissions
            .find_by_id(submission_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("submission '{submission_id}' was not found"))
            })?;

        let organization_id = submission.organization_id();
        let locale = self.locale_for(organization_id).await?;
        if submission.user_id() == actor.user_id() {
            let mut view = SubmissionView::from_submission(&submission, locale);
            view.user_id = Some(submission.user_id());
            return Ok(view);
        }

        self.authorization
            .require_role(
                actor,
                Scope::Organization(organization_id),
                SystemRole::Manager,
            )
            .await?;

        Ok(SubmissionView::from_submission(&submission, locale))
    }

    async fn operational_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Organization> {
        self.organizations
            .find_by_id(organization_id)
            .await?
            .filter(Organization::is_operational)
            .ok_or_else(|| {
                AppError::NotFound(format!("organization '{organization_id}' was not found"))
            })
    }

    async fn locale_for(&self, organization_id: OrganizationId) -> AppResult<Locale> {
        Ok(self
            .organizations
            .find_by_id(organization_id)
            .await?
            .map(|organization| organization.settings().locale)
            .unwrap_or_default())
    }
}
