use async_trait::async_trait;
use chrono::{DateTime, Utc};

use divehub_core::{AppResult, AuditLevel, TraceId};
use divehub_domain::AuditSource;

/// Immutable audit event payload emitted by the audit interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Invocation the event belongs to.
    pub trace_id: TraceId,
    /// Subsystem that emitted the event.
    pub source: AuditSource,
    /// Human-readable audit message.
    pub message: String,
    /// Event severity.
    pub level: AuditLevel,
    /// Emission timestamp.
    pub occurred_at: DateTime<Utc>,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}

/// Persisted audit event projection for operator views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogEntry {
    /// Stable event identifier.
    pub event_id: String,
    /// Invocation the event belongs to.
    pub trace_id: TraceId,
    /// Subsystem that emitted the event.
    pub source: String,
    /// Audit message.
    pub message: String,
    /// Event severity.
    pub level: AuditLevel,
    /// Emission timestamp.
    pub occurred_at: DateTime<Utc>,
}

/// Query parameters for audit log listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogQuery {
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
    /// Optional source filter.
    pub source: Option<String>,
    /// Optional minimum severity filter.
    pub min_level: Option<AuditLevel>,
}

impl Default for AuditLogQuery {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
            source: None,
            min_level: None,
        }
    }
}

/// Upper bound applied to [`AuditLogQuery::limit`].
pub const AUDIT_LOG_MAX_LIMIT: usize = 500;

/// Repository port for audit log reads and retention.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists entries newest first.
    async fn list_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>>;

    /// Lists every entry sharing a trace id, oldest first.
    async fn list_trace(&self, trace_id: TraceId) -> AppResult<Vec<AuditLogEntry>>;

    /// Deletes entries that occurred strictly before `cutoff` and returns the deleted count.
    async fn purge_entries_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}
