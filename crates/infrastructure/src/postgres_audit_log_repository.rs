use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use divehub_application::{AUDIT_LOG_MAX_LIMIT, AuditLogEntry, AuditLogQuery, AuditLogRepository};
use divehub_core::{AppError, AppResult, AuditLevel, TraceId};

#[cfg(test)]
mod tests;

/// PostgreSQL-backed repository for audit log reads and retention.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditEventRow {
    event_id: uuid::Uuid,
    trace_id: uuid::Uuid,
    source: String,
    message: String,
    level: String,
    occurred_at: DateTime<Utc>,
}

impl TryFrom<AuditEventRow> for AuditLogEntry {
    type Error = AppError;

    fn try_from(row: AuditEventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            event_id: row.event_id.to_string(),
            trace_id: TraceId::from_uuid(row.trace_id),
            source: row.source,
            message: row.message,
            level: AuditLevel::from_str(row.level.as_str())?,
            occurred_at: row.occurred_at,
        })
    }
}

fn levels_at_or_above(min_level: Option<AuditLevel>) -> Option<Vec<String>> {
    min_level.map(|min_level| {
        [AuditLevel::Info, AuditLevel::Warn, AuditLevel::Error]
            .into_iter()
            .filter(|level| *level >= min_level)
            .map(|level| level.as_str().to_owned())
            .collect()
    })
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn list_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let capped_limit = query.limit.clamp(1, AUDIT_LOG_MAX_LIMIT) as i64;
        let capped_offset = query.offset.min(10_000) as i64;
        let rows = sqlx::query_as::<_, AuditEventRow>(
            r#"
            SELECT
                id AS event_id,
                trace_id,
                source,
                message,
                level,
                occurred_at
            FROM audit_events
            WHERE ($1::TEXT IS NULL OR source = $1)
                AND ($2::TEXT[] IS NULL OR level = ANY($2))
            ORDER BY occurred_at DESC
            LIMIT $3
            OFFSET $4
            "#,
        )
        .bind(query.source)
        .bind(levels_at_or_above(query.min_level))
        .bind(capped_limit)
        .bind(capped_offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list audit events: {error}")))?;

        rows.into_iter().map(AuditLogEntry::try_from).collect()
    }

    async fn list_trace(&self, trace_id: TraceId) -> AppResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditEventRow>(
            r#"
            SELECT
                id AS event_id,
                trace_id,
                source,
                message,
                level,
                occurred_at
            FROM audit_events
            WHERE trace_id = $1
            ORDER BY occurred_at ASC
            "#,
        )
        .bind(trace_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list audit events for trace '{trace_id}': {error}"
            ))
        })?;

        rows.into_iter().map(AuditLogEntry::try_from).collect()
    }

    async fn purge_entries_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM audit_events
            WHERE occurred_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to purge audit events older than '{}': {error}",
                cutoff.to_rfc3339()
            ))
        })?;

        Ok(result.rows_affected())
    }
}
