//! Port fakes shared by service tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use emociograma_core::{AppError, AppResult, OrganizationId, UserId, UserIdentity};
use emociograma_domain::{
    Alert, AlertId, AlertNotification, AlertResolution, AlertSnapshot, AlertStatistics,
    NewOrganizationInput, Organization, OrganizationSettings, OrganizationType, Role,
    RoleAssignment, RoleId, Scope, SeverityCounts, Submission, SubmissionId, SystemRole,
    compare_for_listing,
};

use crate::alert_ports::{AlertListQuery, AlertRepository, EmailMessage, EmailService, SentEmail};
use crate::export_ports::{ExportFormat, ExportRenderer, ExportTable};
use crate::organization_ports::OrganizationRepository;
use crate::role_ports::{ManagerContact, RoleRepository};
use crate::submission_ports::{SubmissionListQuery, SubmissionRepository};

pub(crate) fn actor(user_id: UserId) -> UserIdentity {
    UserIdentity::new(user_id, "Test User", None)
}

pub(crate) fn organization_with_threshold(name: &str, threshold: u8) -> Organization {
    Organization::new(NewOrganizationInput {
        name: name.to_owned(),
        organization_type: OrganizationType::Company,
        parent_id: None,
        settings: Some(OrganizationSettings {
            alert_threshold: threshold,
            ..OrganizationSettings::default()
        }),
    })
    .unwrap_or_else(|_| unreachable!())
}

#[derive(Default)]
pub(crate) struct FakeRoleRepository {
    pub roles: Mutex<Vec<Role>>,
    pub assignments: Mutex<Vec<RoleAssignment>>,
    pub emails: Mutex<HashMap<UserId, String>>,
    /// Makes existence checks report nothing, as a concurrent writer would observe.
    pub stale_existence_checks: bool,
    /// Number of upcoming member lookups that fail before the directory recovers.
    pub failing_member_lookups: AtomicUsize,
}

impl FakeRoleRepository {
    pub fn with_system_roles() -> Self {
        let roles = SystemRole::all()
            .iter()
            .map(|role| Role::system(RoleId::new(), *role).unwrap_or_else(|_| unreachable!()))
            .collect();

        Self {
            roles: Mutex::new(roles),
            ..Self::default()
        }
    }

    pub async fn role_id(&self, role: SystemRole) -> RoleId {
        self.roles
            .lock()
            .await
            .iter()
            .find(|stored| stored.system_role() == Some(role))
            .map(Role::id)
            .unwrap_or_else(|| unreachable!())
    }

    pub async fn grant(&self, user_id: UserId, role: SystemRole, scope: Scope) {
        let role_id = self.role_id(role).await;
        self.assignments.lock().await.push(RoleAssignment {
            user_id,
            role_id,
            scope,
            assigned_by: None,
            assigned_at: Utc::now(),
        });
    }
}

#[async_trait]
impl RoleRepository for FakeRoleRepository {
    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.name().as_str() == name)
            .cloned())
    }

    async fn find_role_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.id() == role_id)
            .cloned())
    }

    async fn assignment_exists(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: Scope,
    ) -> AppResult<bool> {
        if self.stale_existence_checks {
            return Ok(false);
        }

        Ok(self.assignments.lock().await.iter().any(|assignment| {
            assignment.user_id == user_id
                && assignment.role_id == role_id
                && assignment.scope == scope
        }))
    }

    async fn insert_assignment(&self, assignment: RoleAssignment) -> AppResult<()> {
        let mut assignments = self.assignments.lock().await;
        if assignments.iter().any(|stored| {
            stored.user_id == assignment.user_id
                && stored.role_id == assignment.role_id
                && stored.scope == assignment.scope
        }) {
            return Err(AppError::Conflict(
                "duplicate key value violates unique constraint".to_owned(),
            ));
        }

        assignments.push(assignment);
        Ok(())
    }

    async fn delete_assignment(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: Scope,
    ) -> AppResult<u64> {
        let mut assignments = self.assignments.lock().await;
        let before = assignments.len();
        assignments.retain(|assignment| {
            !(assignment.user_id == user_id
                && assignment.role_id == role_id
                && assignment.scope == scope)
        });
        Ok(u64::try_from(before - assignments.len()).unwrap_or(u64::MAX))
    }

    async fn list_roles_for_user(
        &self,
        user_id: UserId,
        scopes: &[Scope],
    ) -> AppResult<Vec<Role>> {
        let assignments = self.assignments.lock().await;
        let roles = self.roles.lock().await;
        let held: HashSet<RoleId> = assignments
            .iter()
            .filter(|assignment| assignment.user_id == user_id && scopes.contains(&assignment.scope))
            .map(|assignment| assignment.role_id)
            .collect();

        Ok(roles
            .iter()
            .filter(|role| held.contains(&role.id()))
            .cloned()
            .collect())
    }

    async fn list_assignments_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|assignment| assignment.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_organization_members_with_roles(
        &self,
        organization_id: OrganizationId,
        roles: &[SystemRole],
    ) -> AppResult<Vec<ManagerContact>> {
        if self
            .failing_member_lookups
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
        {
            return Err(AppError::Internal("member directory unavailable".to_owned()));
        }

        let assignments = self.assignments.lock().await;
        let stored_roles = self.roles.lock().await;
        let emails = self.emails.lock().await;

        let mut seen = HashSet::new();
        let mut contacts = Vec::new();
        for assignment in assignments.iter() {
            if assignment.scope != Scope::Organization(organization_id) {
                continue;
            }

            let qualifies = stored_roles.iter().any(|role| {
                role.id() == assignment.role_id
                    && role
                        .system_role()
                        .is_some_and(|system_role| roles.contains(&system_role))
            });

            if qualifies && seen.insert(assignment.user_id) {
                contacts.push(ManagerContact {
                    user_id: assignment.user_id,
                    email: emails
                        .get(&assignment.user_id)
                        .cloned()
                        .unwrap_or_else(|| format!("{}@example.com", assignment.user_id)),
                    display_name: "Manager".to_owned(),
                });
            }
        }

        Ok(contacts)
    }
}

#[derive(Default)]
pub(crate) struct FakeOrganizationRepository {
    pub organizations: Mutex<HashMap<OrganizationId, Organization>>,
}

impl FakeOrganizationRepository {
    pub fn with(organizations: Vec<Organization>) -> Self {
        Self {
            organizations: Mutex::new(
                organizations
                    .into_iter()
                    .map(|organization| (organization.id(), organization))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl OrganizationRepository for FakeOrganizationRepository {
    async fn find_by_id(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Option<Organization>> {
        Ok(self
            .organizations
            .lock()
            .await
            .get(&organization_id)
            .cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Organization>> {
        Ok(self
            .organizations
            .lock()
            .await
            .values()
            .find(|organization| organization.slug() == slug && !organization.is_deleted())
            .cloned())
    }

    async fn list_children(&self, parent_id: OrganizationId) -> AppResult<Vec<Organization>> {
        Ok(self
            .organizations
            .lock()
            .await
            .values()
            .filter(|organization| {
                organization.parent_id() == Some(parent_id) && !organization.is_deleted()
            })
            .cloned()
            .collect())
    }

    async fn list_operational(&self) -> AppResult<Vec<Organization>> {
        Ok(self
            .organizations
            .lock()
            .await
            .values()
            .filter(|organization| organization.is_operational())
            .cloned()
            .collect())
    }

    async fn insert(&self, organization: &Organization) -> AppResult<()> {
        let mut organizations = self.organizations.lock().await;
        if organizations
            .values()
            .any(|stored| stored.slug() == organization.slug() && !stored.is_deleted())
        {
            return Err(AppError::Conflict(format!(
                "slug '{}' already exists",
                organization.slug()
            )));
        }

        organizations.insert(organization.id(), organization.clone());
        Ok(())
    }

    async fn update(&self, organization: &Organization) -> AppResult<()> {
        self.organizations
            .lock()
            .await
            .insert(organization.id(), organization.clone());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeSubmissionRepository {
    pub submissions: Mutex<Vec<Submission>>,
}

#[async_trait]
impl SubmissionRepository for FakeSubmissionRepository {
    async fn insert(&self, submission: &Submission) -> AppResult<()> {
        self.submissions.lock().await.push(submission.clone());
        Ok(())
    }

    async fn find_by_id(&self, submission_id: SubmissionId) -> AppResult<Option<Submission>> {
        Ok(self
            .submissions
            .lock()
            .await
            .iter()
            .find(|submission| submission.id() == submission_id)
            .cloned())
    }

    async fn list_by_organization(
        &self,
        organization_id: OrganizationId,
        query: &SubmissionListQuery,
    ) -> AppResult<Vec<Submission>> {
        let mut submissions: Vec<Submission> = self
            .submissions
            .lock()
            .await
            .iter()
            .filter(|submission| {
                submission.organization_id() == organization_id
                    && query
                        .from
                        .is_none_or(|from| submission.submitted_at() >= from)
                    && query.to.is_none_or(|to| submission.submitted_at() <= to)
            })
            .cloned()
            .collect();
        submissions.sort_by_key(|submission| std::cmp::Reverse(submission.submitted_at()));

        Ok(submissions
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn purge_submitted_before(
        &self,
        organization_id: OrganizationId,
        cutoff: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut submissions = self.submissions.lock().await;
        let before = submissions.len();
        submissions.retain(|submission| {
            !(submission.organization_id() == organization_id
                && submission.submitted_at() < cutoff)
        });
        Ok(u64::try_from(before - submissions.len()).unwrap_or(u64::MAX))
    }
}

#[derive(Default)]
pub(crate) struct FakeAlertRepository {
    pub alerts: Mutex<Vec<Alert>>,
    pub calls: AtomicUsize,
    /// Number of upcoming submission lookups that miss, as a concurrent insert would observe.
    pub stale_submission_lookups: AtomicUsize,
}

impl FakeAlertRepository {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn stored(&self, alert_id: AlertId) -> Option<Alert> {
        self.alerts
            .lock()
            .await
            .iter()
            .find(|alert| alert.id() == alert_id)
            .cloned()
    }

    /// Inserts an alert with an explicit creation time.
    pub async fn seed(&self, alert: &Alert, created_at: DateTime<Utc>) {
        let restored = Alert::restore(AlertSnapshot {
            id: alert.id(),
            organization_id: alert.organization_id(),
            submission_id: alert.submission_id(),
            alert_type: alert.alert_type(),
            severity: alert.severity(),
            message: alert.message().to_owned(),
            resolution: alert.resolution().cloned(),
            notification: alert.notification().clone(),
            created_at,
            updated_at: created_at,
        });
        self.alerts.lock().await.push(restored);
    }
}

#[async_trait]
impl AlertRepository for FakeAlertRepository {
    async fn insert(&self, alert: &Alert) -> AppResult<()> {
        self.record_call();
        let mut alerts = self.alerts.lock().await;
        if alerts
            .iter()
            .any(|stored| stored.submission_id() == alert.submission_id())
        {
            return Err(AppError::Conflict(format!(
                "submission '{}' already has an alert",
                alert.submission_id()
            )));
        }

        alerts.push(alert.clone());
        Ok(())
    }

    async fn find_by_id(&self, alert_id: AlertId) -> AppResult<Option<Alert>> {
        self.record_call();
        Ok(self.stored(alert_id).await)
    }

    async fn find_by_submission(&self, submission_id: SubmissionId) -> AppResult<Option<Alert>> {
        self.record_call();
        if self
            .stale_submission_lookups
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
        {
            return Ok(None);
        }

        Ok(self
            .alerts
            .lock()
            .await
            .iter()
            .find(|alert| alert.submission_id() == submission_id)
            .cloned())
    }

    async fn save_notification(
        &self,
        alert_id: AlertId,
        notification: &AlertNotification,
        updated_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.record_call();
        let mut alerts = self.alerts.lock().await;
        let alert = alerts
            .iter_mut()
            .find(|alert| alert.id() == alert_id)
            .ok_or_else(|| AppError::NotFound(format!("alert '{alert_id}' was not found")))?;
        alert.record_notification(notification.clone(), updated_at);
        Ok(())
    }

    async fn save_resolution(
        &self,
        alert_id: AlertId,
        resolution: &AlertResolution,
    ) -> AppResult<Option<Alert>> {
        self.record_call();
        let mut alerts = self.alerts.lock().await;
        let Some(alert) = alerts
            .iter_mut()
            .find(|alert| alert.id() == alert_id && !alert.is_resolved())
        else {
            return Ok(None);
        };

        alert.resolve(
            resolution.resolved_by,
            resolution.notes.clone(),
            resolution.resolved_at,
        )?;
        Ok(Some(alert.clone()))
    }

    async fn resolve_unresolved(
        &self,
        organization_id: OrganizationId,
        alert_ids: &[AlertId],
        resolution: &AlertResolution,
    ) -> AppResult<u64> {
        self.record_call();
        let mut alerts = self.alerts.lock().await;
        let mut resolved = 0_u64;
        for alert in alerts.iter_mut().filter(|alert| {
            alert.organization_id() == organization_id
                && alert_ids.contains(&alert.id())
                && !alert.is_resolved()
        }) {
            alert.resolve(
                resolution.resolved_by,
                resolution.notes.clone(),
                resolution.resolved_at,
            )?;
            resolved += 1;
        }
        Ok(resolved)
    }

    async fn list(
        &self,
        organization_id: OrganizationId,
        query: &AlertListQuery,
    ) -> AppResult<Vec<Alert>> {
        self.record_call();
        let mut alerts: Vec<Alert> = self
            .alerts
            .lock()
            .await
            .iter()
            .filter(|alert| {
                alert.organization_id() == organization_id
                    && (query.include_resolved || !alert.is_resolved())
                    && query
                        .severity
                        .is_none_or(|severity| alert.severity() == severity)
            })
            .cloned()
            .collect();
        alerts.sort_by(compare_for_listing);

        Ok(alerts
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn list_created_between(
        &self,
        organization_id: OrganizationId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Alert>> {
        self.record_call();
        let mut alerts: Vec<Alert> = self
            .alerts
            .lock()
            .await
            .iter()
            .filter(|alert| {
                alert.organization_id() == organization_id
                    && alert.created_at() >= start
                    && alert.created_at() <= end
            })
            .cloned()
            .collect();
        alerts.sort_by_key(|alert| std::cmp::Reverse(alert.created_at()));
        Ok(alerts)
    }

    async fn statistics(
        &self,
        organization_id: OrganizationId,
        resolved_since: DateTime<Utc>,
    ) -> AppResult<AlertStatistics> {
        self.record_call();
        let alerts = self.alerts.lock().await;
        let mut statistics = AlertStatistics::default();
        for alert in alerts
            .iter()
            .filter(|alert| alert.organization_id() == organization_id)
        {
            statistics.total += 1;
            statistics.by_severity.add(alert.severity(), 1);
            match alert.resolution() {
                None => statistics.unresolved += 1,
                Some(resolution) if resolution.resolved_at >= resolved_since => {
                    statistics.resolved_today += 1;
                }
                Some(_) => {}
            }
        }
        Ok(statistics)
    }

    async fn count_unresolved_by_severity(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<SeverityCounts> {
        self.record_call();
        let mut counts = SeverityCounts::default();
        for alert in self.alerts.lock().await.iter().filter(|alert| {
            alert.organization_id() == organization_id && !alert.is_resolved()
        }) {
            counts.add(alert.severity(), 1);
        }
        Ok(counts)
    }
}

#[derive(Default)]
pub(crate) struct FakeEmailService {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub failing_recipients: HashSet<String>,
    pub fail_all: bool,
}

#[async_trait]
impl EmailService for FakeEmailService {
    async fn send(&self, message: EmailMessage) -> AppResult<SentEmail> {
        if self.fail_all || self.failing_recipients.contains(&message.to) {
            return Err(AppError::Internal(format!(
                "mail relay rejected '{}'",
                message.to
            )));
        }

        let mut sent = self.sent.lock().await;
        sent.push(message);
        Ok(SentEmail {
            id: format!("message-{}", sent.len()),
        })
    }
}

pub(crate) struct PipeExportRenderer;

impl ExportRenderer for PipeExportRenderer {
    fn render(&self, _format: ExportFormat, table: &ExportTable) -> AppResult<Vec<u8>> {
        let mut lines = vec![table.columns.join("|")];
        lines.extend(table.rows.iter().map(|row| row.join("|")));
        Ok(lines.join("\n").into_bytes())
    }
}
