//! Emociograma background worker: migrations, data retention and mail checks.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use emociograma_application::{EmailMessage, EmailService, RetentionService};
use emociograma_core::{AppError, AppResult};
use emociograma_infrastructure::{
    ConsoleEmailService, PostgresOrganizationRepository, PostgresSubmissionRepository,
    SmtpEmailConfig, SmtpEmailService,
};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

static MIGRATOR: Migrator = sqlx::migrate!("../../crates/infrastructure/migrations");

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Migrate,
    SweepOnce,
    CheckEmail { to: String },
    Run,
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> AppResult<Self> {
        match args.next().as_deref() {
            None | Some("run") => Ok(Self::Run),
            Some("migrate") => Ok(Self::Migrate),
            Some("sweep-once") => Ok(Self::SweepOnce),
            Some("check-email") => args
                .next()
                .map(|to| Self::CheckEmail { to })
                .ok_or_else(|| {
                    AppError::Validation("check-email requires a recipient address".to_owned())
                }),
            Some(other) => Err(AppError::Validation(format!(
                "unknown command '{other}', expected migrate, sweep-once, check-email or run"
            ))),
        }
    }
}

#[derive(Clone)]
enum EmailProvider {
    Console,
    Smtp(SmtpEmailConfig),
}

#[derive(Clone)]
struct WorkerConfig {
    database_url: String,
    database_max_connections: u32,
    retention_sweep_interval_secs: u64,
    email_provider: EmailProvider,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let command = Command::parse(env::args().skip(1))?;
    let config = WorkerConfig::load()?;

    match command {
        Command::Migrate => {
            let pool = connect_pool(&config).await?;
            run_migrations(&pool).await?;
            info!("migrations applied");
        }
        Command::SweepOnce => {
            let pool = connect_pool(&config).await?;
            run_migrations(&pool).await?;
            run_sweep(&build_retention_service(pool)).await?;
        }
        Command::CheckEmail { to } => {
            let email_service = build_email_service(&config.email_provider)?;
            send_check_email(email_service.as_ref(), to).await?;
        }
        Command::Run => {
            let pool = connect_pool(&config).await?;
            run_migrations(&pool).await?;
            let retention_service = build_retention_service(pool);

            info!(
                interval_secs = config.retention_sweep_interval_secs,
                "emociograma-worker started"
            );

            let mut interval =
                tokio::time::interval(Duration::from_secs(config.retention_sweep_interval_secs));
            loop {
                interval.tick().await;
                if let Err(error) = run_sweep(&retention_service).await {
                    warn!(error = %error, "retention sweep failed");
                }
            }
        }
    }

    Ok(())
}

async fn connect_pool(config: &WorkerConfig) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(config.database_url.as_str())
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))
}

fn build_retention_service(pool: PgPool) -> RetentionService {
    RetentionService::new(
        Arc::new(PostgresOrganizationRepository::new(pool.clone())),
        Arc::new(PostgresSubmissionRepository::new(pool)),
    )
}

fn build_email_service(provider: &EmailProvider) -> AppResult<Arc<dyn EmailService>> {
    match provider {
        EmailProvider::Console => Ok(Arc::new(ConsoleEmailService::new())),
        EmailProvider::Smtp(smtp) => Ok(Arc::new(SmtpEmailService::new(smtp.clone())?)),
    }
}

async fn run_sweep(retention_service: &RetentionService) -> AppResult<()> {
    let entries = retention_service.sweep().await?;
    let purged: u64 = entries.iter().map(|entry| entry.purged).sum();

    info!(
        organizations = entries.len(),
        purged, "retention sweep completed"
    );

    Ok(())
}

async fn send_check_email(email_service: &dyn EmailService, to: String) -> AppResult<()> {
    let receipt = email_service
        .send(EmailMessage {
            to: to.clone(),
            subject: "Emociograma: prueba de correo".to_owned(),
            html_body: "<p>La configuración de correo de Emociograma funciona.</p>".to_owned(),
            text_body: "La configuración de correo de Emociograma funciona.".to_owned(),
        })
        .await?;

    info!(to = %to, email_id = %receipt.id, "check email sent");
    Ok(())
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let database_max_connections = parse_env_u32("DATABASE_MAX_CONNECTIONS", 5)?;
        let retention_sweep_interval_secs = parse_env_u64("RETENTION_SWEEP_INTERVAL_SECS", 3600)?;
        let email_provider = EmailProvider::load()?;

        if database_max_connections == 0 {
            return Err(AppError::Validation(
                "DATABASE_MAX_CONNECTIONS must be greater than zero".to_owned(),
            ));
        }

        if retention_sweep_interval_secs == 0 {
            return Err(AppError::Validation(
                "RETENTION_SWEEP_INTERVAL_SECS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            retention_sweep_interval_secs,
            email_provider,
        })
    }
}

impl EmailProvider {
    fn load() -> AppResult<Self> {
        let provider = env::var("EMAIL_PROVIDER").unwrap_or_else(|_| "console".to_owned());

        match provider.trim().to_ascii_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "smtp" => Ok(Self::Smtp(SmtpEmailConfig {
                host: required_env("SMTP_HOST")?,
                port: parse_env_u16("SMTP_PORT", 587)?,
                username: required_env("SMTP_USERNAME")?,
                password: required_env("SMTP_PASSWORD")?,
                from_address: required_env("SMTP_FROM_ADDRESS")?,
            })),
            other => Err(AppError::Validation(format!(
                "EMAIL_PROVIDER must be 'console' or 'smtp', got '{other}'"
            ))),
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u16(name: &str, default: u16) -> AppResult<u16> {
    match env::var(name) {
        Ok(value) => value.parse::<u16>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> AppResult<u32> {
    match env::var(name) {
        Ok(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
