use chrono::{Duration, Utc};
use emociograma_application::{AlertListQuery, AlertRepository, SubmissionRepository};
use emociograma_core::{AppError, OrganizationId, UserId};
use emociograma_domain::{
    Alert, AlertNotification, AlertResolution, AlertSeverity, AlertType, NewSubmissionInput,
    NotificationStatus, Submission,
};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresAlertRepository;
use crate::PostgresSubmissionRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres alert tests: {error}");
    }

    Some(pool)
}

struct Member {
    organization_id: OrganizationId,
    user_id: UserId,
}

async fn seed_member(pool: &PgPool) -> Member {
    let organization_id = OrganizationId::new();
    let user_id = UserId::new();

    let organization = sqlx::query(
        r#"
            INSERT INTO organizations (id, name, slug, organization_type)
            VALUES ($1, 'Alert Test Org', $2, 'company')
            "#,
    )
    .bind(organization_id.as_uuid())
    .bind(format!("alert-test-{organization_id}"))
    .execute(pool)
    .await;
    assert!(organization.is_ok());

    let user = sqlx::query(
        r#"
            INSERT INTO users (id, email, display_name)
            VALUES ($1, $2, 'Alert Manager')
            "#,
    )
    .bind(user_id.as_uuid())
    .bind(format!("{user_id}@example.com"))
    .execute(pool)
    .await;
    assert!(user.is_ok());

    Member {
        organization_id,
        user_id,
    }
}

async fn raise(pool: &PgPool, member: &Member, level: u8) -> Alert {
    let submission = Submission::new(
        member.organization_id,
        member.user_id,
        NewSubmissionInput {
            emotion_level: level,
            emotion_emoji: "😰".to_owned(),
            category_id: "work".to_owned(),
            is_anonymous: Some(false),
            comment: None,
            department: None,
            team: None,
        },
        false,
    )
    .unwrap_or_else(|_| unreachable!());
    let submissions = PostgresSubmissionRepository::new(pool.clone());
    assert!(submissions.insert(&submission).await.is_ok());

    let alert = Alert::new(
        member.organization_id,
        submission.id(),
        AlertType::ThresholdExceeded,
        AlertSeverity::for_emotion_level(submission.emotion_level()),
        format!("level {level}"),
    );
    let repository = PostgresAlertRepository::new(pool.clone());
    assert!(repository.insert(&alert).await.is_ok());

    alert
}

fn resolution(user_id: UserId, notes: &str) -> AlertResolution {
    AlertResolution {
        resolved_at: Utc::now(),
        resolved_by: user_id,
        notes: Some(notes.to_owned()),
    }
}

#[tokio::test]
async fn second_alert_for_submission_is_conflict() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let member = seed_member(&pool).await;
    let repository = PostgresAlertRepository::new(pool.clone());
    let alert = raise(&pool, &member, 9).await;

    let duplicate = Alert::new(
        member.organization_id,
        alert.submission_id(),
        AlertType::ThresholdExceeded,
        AlertSeverity::Critical,
        "again".to_owned(),
    );
    let result = repository.insert(&duplicate).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let stored = repository
        .find_by_submission(alert.submission_id())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(stored.map(|stored| stored.id()), Some(alert.id()));
}

#[tokio::test]
async fn resolution_is_written_once() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let member = seed_member(&pool).await;
    let repository = PostgresAlertRepository::new(pool.clone());
    let alert = raise(&pool, &member, 7).await;

    let first = repository
        .save_resolution(alert.id(), &resolution(member.user_id, "first"))
        .await
        .unwrap_or_else(|_| unreachable!());
    let resolved = first.unwrap_or_else(|| unreachable!());
    assert!(resolved.is_resolved());

    let second = repository
        .save_resolution(alert.id(), &resolution(member.user_id, "second"))
        .await;
    assert!(matches!(second, Ok(None)));

    let stored = repository
        .find_by_id(alert.id())
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    assert_eq!(
        stored.resolution().and_then(|resolution| resolution.notes.clone()),
        Some("first".to_owned())
    );
}

#[tokio::test]
async fn notification_tracking_roundtrips() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let member = seed_member(&pool).await;
    let repository = PostgresAlertRepository::new(pool.clone());
    let alert = raise(&pool, &member, 8).await;
    let now = Utc::now();

    let notification = AlertNotification::settled(2, vec![member.user_id], now);
    assert!(
        repository
            .save_notification(alert.id(), &notification, now)
            .await
            .is_ok()
    );

    let stored = repository
        .find_by_id(alert.id())
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    assert_eq!(stored.notification().status, NotificationStatus::Sent);
    assert_eq!(stored.notified_users(), &[member.user_id]);
}

#[tokio::test]
async fn listing_bulk_resolution_and_statistics() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let member = seed_member(&pool).await;
    let repository = PostgresAlertRepository::new(pool.clone());
    let medium = raise(&pool, &member, 6).await;
    let critical = raise(&pool, &member, 10).await;
    let high = raise(&pool, &member, 7).await;

    let listed = repository
        .list(member.organization_id, &AlertListQuery::unresolved())
        .await
        .unwrap_or_else(|_| unreachable!());
    let order: Vec<_> = listed.iter().map(Alert::id).collect();
    assert_eq!(order, vec![critical.id(), high.id(), medium.id()]);

    let resolved = repository
        .resolve_unresolved(
            member.organization_id,
            &[critical.id(), high.id()],
            &resolution(member.user_id, "bulk"),
        )
        .await;
    assert!(matches!(resolved, Ok(2)));

    let again = repository
        .resolve_unresolved(
            member.organization_id,
            &[critical.id(), medium.id()],
            &resolution(member.user_id, "bulk"),
        )
        .await;
    assert!(matches!(again, Ok(1)));

    let statistics = repository
        .statistics(member.organization_id, Utc::now() - Duration::hours(1))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(statistics.total, 3);
    assert_eq!(statistics.unresolved, 0);
    assert_eq!(statistics.resolved_today, 3);
    assert_eq!(statistics.by_severity.get(AlertSeverity::Critical), 1);
    assert_eq!(statistics.by_severity.get(AlertSeverity::Low), 0);

    let window = repository
        .list_created_between(
            member.organization_id,
            Utc::now() - Duration::hours(1),
            Utc::now() + Duration::hours(1),
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(window.len(), 3);
}
