use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;

use divehub_core::{AppError, AppResult, TraceId};

use crate::audit_ports::{AUDIT_LOG_MAX_LIMIT, AuditLogEntry, AuditLogQuery, AuditLogRepository};

#[cfg(test)]
mod tests;

/// Default age after which audit events are purged.
pub const DEFAULT_AUDIT_RETENTION_DAYS: u32 = 30;

/// Longest accepted retention window, one hundred years.
pub const MAX_AUDIT_RETENTION_DAYS: u32 = 36_500;

/// Application service for audit trail reads and retention.
#[derive(Clone)]
pub struct AuditEventService {
    repository: Arc<dyn AuditLogRepository>,
    retention: Duration,
}

impl AuditEventService {
    /// Creates a service keeping events for `retention_days` days.
    pub fn new(repository: Arc<dyn AuditLogRepository>, retention_days: u32) -> AppResult<Self> {
        if retention_days == 0 {
            return Err(AppError::Validation(
                "audit retention must be at least one day".to_owned(),
            ));
        }

        if retention_days > MAX_AUDIT_RETENTION_DAYS {
            return Err(AppError::Validation(format!(
                "audit retention must not exceed {MAX_AUDIT_RETENTION_DAYS} days, got {retention_days}"
            )));
        }

        Ok(Self {
            repository,
            retention: Duration::days(i64::from(retention_days)),
        })
    }

    /// Deletes every event older than the retention window and returns the count.
    ///
    /// The cutoff is fixed once when the call starts, so events written while
    /// the purge runs are always newer than it.
    pub async fn cleanup_audit_trail(&self) -> AppResult<u64> {
        let cutoff = Utc::now().checked_sub_signed(self.retention).ok_or_else(|| {
            AppError::Internal(format!(
                "audit retention of {} days reaches before the earliest timestamp",
                self.retention.num_days()
            ))
        })?;
        let deleted = self.repository.purge_entries_older_than(cutoff).await?;

        info!(
            deleted,
            cutoff = %cutoff.to_rfc3339(),
            "audit trail cleanup finished"
        );

        Ok(deleted)
    }

    /// Lists recent entries newest first.
    pub async fn list_recent(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let query = AuditLogQuery {
            limit: query.limit.clamp(1, AUDIT_LOG_MAX_LIMIT),
            ..query
        };
        self.repository.list_entries(query).await
    }

    /// Lists the events of one operation invocation in emission order.
    pub async fn trace(&self, trace_id: TraceId) -> AppResult<Vec<AuditLogEntry>> {
        self.repository.list_trace(trace_id).await
    }
}
