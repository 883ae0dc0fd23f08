use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use divehub_application::ClubEventRepository;
use divehub_domain::{ClubEvent, ClubEventId, ClubEventInput, ClubEventStatus};

use super::PostgresClubEventRepository;
use crate::test_support::test_pool;

fn event(title: &str, ends_at: DateTime<Utc>) -> ClubEvent {
    let Ok(event) = ClubEvent::new(ClubEventInput {
        title: title.to_owned(),
        starts_at: ends_at - Duration::hours(3),
        ends_at,
    }) else {
        panic!("event should be valid");
    };
    event
}

async fn close_due(
    repository: &PostgresClubEventRepository,
    ours: &HashSet<ClubEventId>,
    now: DateTime<Utc>,
) -> usize {
    let due = repository
        .list_events_due_for_closing(now)
        .await
        .unwrap_or_default();

    let mut closed = 0;
    for event in due.iter().filter(|event| ours.contains(&event.event_id())) {
        let updated = repository
            .update_status(event.event_id(), ClubEventStatus::Open, ClubEventStatus::Held)
            .await;
        if updated.unwrap_or(false) {
            closed += 1;
        }
    }
    closed
}

#[tokio::test]
async fn closing_pass_holds_elapsed_events_exactly_once() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresClubEventRepository::new(pool);
    let now = Utc::now();
    let events = [
        event("reef dive", now - Duration::days(2)),
        event("night dive", now - Duration::hours(1)),
        event("pool training", now - Duration::minutes(1)),
        event("wreck dive", now + Duration::hours(1)),
        event("cave course", now + Duration::days(7)),
    ];
    let ours: HashSet<ClubEventId> = events.iter().map(ClubEvent::event_id).collect();

    for saved in events.iter().cloned() {
        assert!(repository.save_event(saved).await.is_ok());
    }

    assert_eq!(close_due(&repository, &ours, now).await, 3);
    assert_eq!(close_due(&repository, &ours, now).await, 0);

    let mut statuses = Vec::new();
    for stored in &events {
        let found = repository.find_event(stored.event_id()).await.ok().flatten();
        statuses.push(found.map(|event| event.status()));
    }
    assert_eq!(
        statuses,
        vec![
            Some(ClubEventStatus::Held),
            Some(ClubEventStatus::Held),
            Some(ClubEventStatus::Held),
            Some(ClubEventStatus::Open),
            Some(ClubEventStatus::Open),
        ]
    );
}

#[tokio::test]
async fn status_update_loses_to_a_concurrent_change() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresClubEventRepository::new(pool);
    let saved = event("reef dive", Utc::now() - Duration::hours(1));
    let event_id = saved.event_id();
    assert!(repository.save_event(saved).await.is_ok());

    let cancelled = repository
        .update_status(event_id, ClubEventStatus::Open, ClubEventStatus::Cancelled)
        .await;
    let held = repository
        .update_status(event_id, ClubEventStatus::Open, ClubEventStatus::Held)
        .await;

    assert_eq!(cancelled.ok(), Some(true));
    assert_eq!(held.ok(), Some(false));
}

#[tokio::test]
async fn invalid_transition_is_rejected_before_querying() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresClubEventRepository::new(pool);
    let result = repository
        .update_status(ClubEventId::new(), ClubEventStatus::Held, ClubEventStatus::Open)
        .await;

    assert!(result.is_err());
}
