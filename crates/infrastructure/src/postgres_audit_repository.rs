use async_trait::async_trait;
use sqlx::PgPool;

use divehub_application::{AuditEvent, AuditRepository};
use divehub_core::{AppError, AppResult};

/// PostgreSQL-backed append-only audit repository.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_events (
                trace_id,
                source,
                message,
                level,
                occurred_at
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.trace_id.as_uuid())
        .bind(event.source.as_str())
        .bind(event.message)
        .bind(event.level.as_str())
        .bind(event.occurred_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to append audit event for trace '{}': {error}",
                event.trace_id
            ))
        })?;

        Ok(())
    }
}
