//! DiveHub background worker: closes elapsed events, flushes the email queue
//! and prunes the audit trail on fixed schedules.

#![forbid(unsafe_code)]

mod worker_config;

use std::sync::Arc;

use divehub_application::{
    AuditEventService, AuditTrailCleanupSchedule, ClosingEventSchedule, ClubEventService,
    EmailQueueSchedule, EmailQueueService, EmailService, JobRunner, ScheduledJob,
};
use divehub_core::{AppError, AppResult};
use divehub_infrastructure::{
    ConsoleEmailService, MIGRATOR, PostgresAuditLogRepository, PostgresAuditRepository,
    PostgresClubEventRepository, PostgresEmailQueueRepository, SmtpEmailService,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::worker_config::{EmailProviderConfig, WorkerConfig};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let pool = connect_pool(&config).await?;

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let runners: Vec<JobRunner> = build_jobs(pool, &config)?
        .into_iter()
        .map(JobRunner::new)
        .collect();
    let handles: Vec<_> = runners
        .iter()
        .map(|runner| runner.clone().spawn())
        .collect();

    info!(
        jobs = handles.len(),
        audit_retention_days = config.audit_retention_days,
        email_batch_size = config.email_queue.batch_size,
        "divehub-worker started"
    );

    tokio::signal::ctrl_c().await.map_err(|error| {
        AppError::Internal(format!("failed to listen for shutdown signal: {error}"))
    })?;

    for handle in &handles {
        handle.abort();
    }

    for runner in &runners {
        if runner.is_running() {
            info!(job = runner.name(), "waiting for the run in flight to finish");
        }
        runner.wait_idle().await;
    }

    info!("divehub-worker stopped");
    Ok(())
}

async fn connect_pool(config: &WorkerConfig) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(config.database_url.as_str())
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn build_email_service(provider: &EmailProviderConfig) -> AppResult<Arc<dyn EmailService>> {
    match provider {
        EmailProviderConfig::Console => {
            info!("email provider: console");
            Ok(Arc::new(ConsoleEmailService::new()))
        }
        EmailProviderConfig::Smtp(smtp) => {
            info!(host = %smtp.host, port = smtp.port, "email provider: smtp");
            Ok(Arc::new(SmtpEmailService::new(smtp.clone().into())?))
        }
    }
}

fn build_jobs(pool: PgPool, config: &WorkerConfig) -> AppResult<Vec<Arc<dyn ScheduledJob>>> {
    let club_event_service = ClubEventService::new(
        Arc::new(PostgresClubEventRepository::new(pool.clone())),
        Arc::new(PostgresAuditRepository::new(pool.clone())),
    )?;
    let email_queue_service = EmailQueueService::new(
        Arc::new(PostgresEmailQueueRepository::new(pool.clone())),
        build_email_service(&config.email_provider)?,
        config.email_queue,
    )?;
    let audit_event_service = AuditEventService::new(
        Arc::new(PostgresAuditLogRepository::new(pool)),
        config.audit_retention_days,
    )?;

    let jobs: Vec<Arc<dyn ScheduledJob>> = vec![
        Arc::new(ClosingEventSchedule::new(club_event_service)),
        Arc::new(EmailQueueSchedule::new(email_queue_service)),
        Arc::new(AuditTrailCleanupSchedule::new(audit_event_service)),
    ];

    Ok(jobs)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
