use async_trait::async_trait;
use chrono::{DateTime, Utc};
use divehub_application::{
    AUDIT_LOG_MAX_LIMIT, AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository,
    AuditRepository,
};
use divehub_core::{AppResult, TraceId};
use tokio::sync::RwLock;
use uuid::Uuid;


/// In-memory audit store serving both the write and the read ports.
#[derive(Debug, Default)]
pub struct InMemoryAuditRepository {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryAuditRepository {
    /// Creates an empty in-memory audit store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Returns the number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.entries.write().await.push(AuditLogEntry {
            event_id: Uuid::new_v4().to_string(),
            trace_id: event.trace_id,
            source: event.source.as_str().to_owned(),
            message: event.message,
            level: event.level,
            occurred_at: event.occurred_at,
        });

        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditRepository {
    async fn list_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let entries = self.entries.read().await;

        // Reverse first so equal timestamps keep newest-appended-first after the stable sort.
        let mut listed: Vec<AuditLogEntry> = entries
            .iter()
            .rev()
            .filter(|entry| {
                query
                    .source
                    .as_deref()
                    .is_none_or(|source| entry.source == source)
                    && query.min_level.is_none_or(|level| entry.level >= level)
            })
            .cloned()
            .collect();
        listed.sort_by(|left, right| right.occurred_at.cmp(&left.occurred_at));

        Ok(listed
            .into_iter()
            .skip(query.offset)
            .take(query.limit.clamp(1, AUDIT_LOG_MAX_LIMIT))
            .collect())
    }

    async fn list_trace(&self, trace_id: TraceId) -> AppResult<Vec<AuditLogEntry>> {
        let mut listed: Vec<AuditLogEntry> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|entry| entry.trace_id == trace_id)
            .cloned()
            .collect();
        listed.sort_by_key(|entry| entry.occurred_at);

        Ok(listed)
    }

    async fn purge_entries_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|entry| entry.occurred_at >= cutoff);

        Ok((before - entries.len()) as u64)
    }
}
