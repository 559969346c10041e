use async_trait::async_trait;
use chrono::{DateTime, Utc};

use emociograma_core::{AppResult, OrganizationId};
use emociograma_domain::{Submission, SubmissionId};

/// Query parameters for submission listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionListQuery {
    /// Maximum rows returned; unbounded when omitted.
    pub limit: Option<usize>,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
    /// Inclusive lower bound on submission time.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on submission time.
    pub to: Option<DateTime<Utc>>,
}

/// Repository port for emotional check-ins.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Persists a new submission.
    async fn insert(&self, submission: &Submission) -> AppResult<()>;

    /// Finds a submission by id.
    async fn find_by_id(&self, submission_id: SubmissionId) -> AppResult<Option<Submission>>;

    /// Lists organization submissions, most recent first.
    async fn list_by_organization(
        &self,
        organization_id: OrganizationId,
        query: &SubmissionListQuery,
    ) -> AppResult<Vec<Submission>>;

    /// Deletes submissions, and their alerts, submitted before the cutoff.
    async fn purge_submitted_before(
        &self,
        organization_id: OrganizationId,
        cutoff: DateTime<Utc>,
    ) -> AppResult<u64>;
}
