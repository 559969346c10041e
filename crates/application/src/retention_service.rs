use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use emociograma_core::{AppResult, OrganizationId};

use crate::organization_ports::OrganizationRepository;
use crate::submission_ports::SubmissionRepository;

/// Purge outcome for one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionSweepEntry {
    /// Swept organization.
    pub organization_id: OrganizationId,
    /// Cutoff applied to submission time.
    pub cutoff: DateTime<Utc>,
    /// Submissions deleted, together with their alerts.
    pub purged: u64,
}

/// Enforces per-organization data retention windows.
#[derive(Clone)]
pub struct RetentionService {
    organizations: Arc<dyn OrganizationRepository>,
    submissions: Arc<dyn SubmissionRepository>,
}

impl RetentionService {
    /// Creates a new retention service.
    #[must_use]
    pub fn new(
        organizations: Arc<dyn OrganizationRepository>,
        submissions: Arc<dyn SubmissionRepository>,
    ) -> Self {
        Self {
            organizations,
            submissions,
        }
    }

    /// Purges submissions older than each active organization's retention window.
    pub async fn sweep(&self) -> AppResult<Vec<RetentionSweepEntry>> {
        self.sweep_at(Utc::now()).await
    }

    /// Runs a sweep as of `now`.
    ///
    /// A failure for one organization is logged and does not stop the sweep.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> AppResult<Vec<RetentionSweepEntry>> {
        let organizations = self.organizations.list_operational().await?;
        let mut entries = Vec::with_capacity(organizations.len());

        for organization in organizations {
            let organization_id = organization.id();
            let cutoff =
                now - Duration::days(i64::from(organization.settings().data_retention_days));

            match self
                .submissions
                .purge_submitted_before(organization_id, cutoff)
                .await
            {
                Ok(purged) => {
                    if purged > 0 {
                        info!(
                            organization_id = %organization_id,
                            purged,
                            cutoff = %cutoff,
                            "retention sweep purged submissions"
                        );
                    }
                    entries.push(RetentionSweepEntry {
                        organization_id,
                        cutoff,
                        purged,
                    });
                }
                Err(error) => {
                    warn!(
                        organization_id = %organization_id,
                        error = %error,
                        "retention sweep failed for organization"
                    );
                }
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use emociograma_core::UserId;
    use emociograma_domain::{
        NewOrganizationInput, Organization, OrganizationSettings, OrganizationType, Submission,
        SubmissionId, SubmissionSnapshot,
    };

    use crate::test_support::{FakeOrganizationRepository, FakeSubmissionRepository};

    use super::RetentionService;

    fn organization(name: &str, retention_days: u16) -> Organization {
        Organization::new(NewOrganizationInput {
            name: name.to_owned(),
            organization_type: OrganizationType::Company,
            parent_id: None,
            settings: Some(OrganizationSettings {
                data_retention_days: retention_days,
                ..OrganizationSettings::default()
            }),
        })
        .unwrap_or_else(|_| unreachable!())
    }

    fn submission(organization: &Organization, age_days: i64) -> Submission {
        Submission::restore(SubmissionSnapshot {
            id: SubmissionId::new(),
            organization_id: organization.id(),
            user_id: UserId::new(),
            emotion_level: 5,
            emotion_emoji: "😐".to_owned(),
            category_id: "work".to_owned(),
            is_anonymous: false,
            comment: None,
            comment_flagged: false,
            submitted_at: Utc::now() - Duration::days(age_days),
            department: None,
            team: None,
        })
        .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn sweep_applies_each_organization_window() {
        let short = organization("Acme Salud", 30);
        let long = organization("Beta Bienestar", 365);
        let mut closed = organization("Gamma Cerrada", 1);
        assert!(closed.deactivate().is_ok());

        let submissions = Arc::new(FakeSubmissionRepository::default());
        submissions.submissions.lock().await.extend([
            submission(&short, 45),
            submission(&short, 5),
            submission(&long, 45),
            submission(&closed, 45),
        ]);
        let service = RetentionService::new(
            Arc::new(FakeOrganizationRepository::with(vec![
                short.clone(),
                long.clone(),
                closed,
            ])),
            submissions.clone(),
        );

        let entries = service.sweep().await.unwrap_or_else(|_| unreachable!());

        assert_eq!(entries.len(), 2);
        let purged_for = |organization: &Organization| {
            entries
                .iter()
                .find(|entry| entry.organization_id == organization.id())
                .map(|entry| entry.purged)
        };
        assert_eq!(purged_for(&short), Some(1));
        assert_eq!(purged_for(&long), Some(0));
        assert_eq!(submissions.submissions.lock().await.len(), 3);
    }
}
