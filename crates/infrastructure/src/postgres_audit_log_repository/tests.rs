use chrono::{Duration, Utc};
use divehub_application::{AuditEvent, AuditLogQuery, AuditLogRepository, AuditRepository};
use divehub_core::{AuditLevel, TraceId};
use divehub_domain::AuditSource;

use super::PostgresAuditLogRepository;
use crate::PostgresAuditRepository;
use crate::test_support::test_pool;

fn event(trace_id: TraceId, source: &AuditSource, message: &str, age: Duration) -> AuditEvent {
    AuditEvent {
        trace_id,
        source: source.clone(),
        message: message.to_owned(),
        level: AuditLevel::Info,
        occurred_at: Utc::now() - age,
    }
}

#[tokio::test]
async fn purge_follows_retention_cutoff_and_is_idempotent() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let writer = PostgresAuditRepository::new(pool.clone());
    let repository = PostgresAuditLogRepository::new(pool.clone());
    let Ok(source) = AuditSource::new(format!("purge-test-{}", TraceId::new())) else {
        panic!("source should be valid");
    };
    let old_trace = TraceId::new();
    let recent_trace = TraceId::new();

    for (trace_id, message, age) in [
        (old_trace, "old start", Duration::days(3_650)),
        (old_trace, "old ok", Duration::days(3_650)),
        (recent_trace, "recent start", Duration::minutes(1)),
    ] {
        let appended = writer.append_event(event(trace_id, &source, message, age)).await;
        assert!(appended.is_ok());
    }

    let cutoff = Utc::now() - Duration::days(3_000);
    let first = repository.purge_entries_older_than(cutoff).await;
    assert!(first.unwrap_or_default() >= 2);

    let second = repository.purge_entries_older_than(cutoff).await;
    assert_eq!(second.ok(), Some(0));

    let old_entries = repository.list_trace(old_trace).await.unwrap_or_default();
    let recent_entries = repository.list_trace(recent_trace).await.unwrap_or_default();
    assert!(old_entries.is_empty());
    assert_eq!(recent_entries.len(), 1);
}

#[tokio::test]
async fn list_entries_filters_by_source_and_level() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let writer = PostgresAuditRepository::new(pool.clone());
    let repository = PostgresAuditLogRepository::new(pool);
    let Ok(source) = AuditSource::new(format!("filter-test-{}", TraceId::new())) else {
        panic!("source should be valid");
    };
    let trace_id = TraceId::new();

    let start = event(trace_id, &source, "cancelling event", Duration::seconds(1));
    let mut warning = event(trace_id, &source, "event 1 cannot be cancelled", Duration::zero());
    warning.level = AuditLevel::Warn;
    assert!(writer.append_event(start).await.is_ok());
    assert!(writer.append_event(warning).await.is_ok());

    let listed = repository
        .list_entries(AuditLogQuery {
            source: Some(source.as_str().to_owned()),
            min_level: Some(AuditLevel::Warn),
            ..AuditLogQuery::default()
        })
        .await
        .unwrap_or_default();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].message, "event 1 cannot be cancelled");
    assert_eq!(listed[0].trace_id, trace_id);

    let trace = repository.list_trace(trace_id).await.unwrap_or_default();
    let messages: Vec<&str> = trace.iter().map(|entry| entry.message.as_str()).collect();
    assert_eq!(messages, vec!["cancelling event", "event 1 cannot be cancelled"]);
}
