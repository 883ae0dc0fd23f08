use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use divehub_core::{AppError, AppResult, AuditLevel, TraceId};

use crate::audit_ports::{AuditLogEntry, AuditLogQuery, AuditLogRepository};

use super::{AuditEventService, MAX_AUDIT_RETENTION_DAYS};

#[derive(Default)]
struct FakeAuditLogRepository {
    entries: Mutex<Vec<AuditLogEntry>>,
    last_query: Mutex<Option<AuditLogQuery>>,
}

impl FakeAuditLogRepository {
    async fn seed(&self, trace_id: TraceId, message: &str, age: Duration) {
        self.entries.lock().await.push(AuditLogEntry {
            event_id: format!("event-{message}"),
            trace_id,
            source: "events".to_owned(),
            message: message.to_owned(),
            level: AuditLevel::Info,
            occurred_at: Utc::now() - age,
        });
    }
}

#[async_trait]
impl AuditLogRepository for FakeAuditLogRepository {
    async fn list_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let limit = query.limit;
        *self.last_query.lock().await = Some(query);
        let mut entries = self.entries.lock().await.clone();
        entries.sort_by(|left, right| right.occurred_at.cmp(&left.occurred_at));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn list_trace(&self, trace_id: TraceId) -> AppResult<Vec<AuditLogEntry>> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .filter(|entry| entry.trace_id == trace_id)
            .cloned()
            .collect())
    }

    async fn purge_entries_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|entry| entry.occurred_at >= cutoff);
        Ok((before - entries.len()) as u64)
    }
}

#[tokio::test]
async fn cleanup_purges_only_expired_events_and_is_idempotent() {
    let repository = Arc::new(FakeAuditLogRepository::default());
    let trace_id = TraceId::new();
    repository.seed(trace_id, "old start", Duration::days(45)).await;
    repository.seed(trace_id, "old ok", Duration::days(31)).await;
    repository.seed(trace_id, "recent", Duration::days(1)).await;

    let service = AuditEventService::new(repository.clone(), 30);
    let Ok(service) = service else {
        panic!("service should accept a positive retention");
    };

    assert_eq!(service.cleanup_audit_trail().await.ok(), Some(2));
    assert_eq!(service.cleanup_audit_trail().await.ok(), Some(0));

    let remaining = service.trace(trace_id).await.unwrap_or_default();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].message, "recent");
}

#[tokio::test]
async fn zero_retention_is_rejected() {
    let repository = Arc::new(FakeAuditLogRepository::default());
    assert!(AuditEventService::new(repository, 0).is_err());
}

#[tokio::test]
async fn retention_beyond_the_maximum_is_rejected() {
    let repository = Arc::new(FakeAuditLogRepository::default());

    let result = AuditEventService::new(repository, 200_000_000);

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn cleanup_with_the_longest_retention_keeps_everything() {
    let repository = Arc::new(FakeAuditLogRepository::default());
    repository
        .seed(TraceId::new(), "decade old", Duration::days(3_650))
        .await;
    let Ok(service) = AuditEventService::new(repository, MAX_AUDIT_RETENTION_DAYS) else {
        panic!("service should accept the maximum retention");
    };

    assert_eq!(service.cleanup_audit_trail().await.ok(), Some(0));
}

#[tokio::test]
async fn list_recent_clamps_the_limit() {
    let repository = Arc::new(FakeAuditLogRepository::default());
    let Ok(service) = AuditEventService::new(repository.clone(), 30) else {
        panic!("service should build");
    };

    let listed = service
        .list_recent(AuditLogQuery {
            limit: 10_000,
            ..AuditLogQuery::default()
        })
        .await;
    assert!(listed.is_ok());

    let recorded_limit = repository
        .last_query
        .lock()
        .await
        .as_ref()
        .map(|query| query.limit);
    assert_eq!(recorded_limit, Some(500));
}
