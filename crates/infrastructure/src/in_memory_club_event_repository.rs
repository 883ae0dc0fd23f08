use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use divehub_application::ClubEventRepository;
use divehub_core::{AppError, AppResult};
use divehub_domain::{ClubEvent, ClubEventId, ClubEventStatus};
use tokio::sync::RwLock;

/// In-memory club event repository.
#[derive(Debug, Default)]
pub struct InMemoryClubEventRepository {
    events: RwLock<HashMap<ClubEventId, ClubEvent>>,
}

impl InMemoryClubEventRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ClubEventRepository for InMemoryClubEventRepository {
    async fn save_event(&self, event: ClubEvent) -> AppResult<()> {
        let mut events = self.events.write().await;

        if events.contains_key(&event.event_id()) {
            return Err(AppError::Conflict(format!(
                "club event '{}' already exists",
                event.event_id()
            )));
        }

        events.insert(event.event_id(), event);
        Ok(())
    }

    async fn find_event(&self, event_id: ClubEventId) -> AppResult<Option<ClubEvent>> {
        Ok(self.events.read().await.get(&event_id).cloned())
    }

    async fn list_events_due_for_closing(&self, now: DateTime<Utc>) -> AppResult<Vec<ClubEvent>> {
        let mut due: Vec<ClubEvent> = self
            .events
            .read()
            .await
            .values()
            .filter(|event| event.is_due_for_closing(now))
            .cloned()
            .collect();
        due.sort_by_key(ClubEvent::ends_at);

        Ok(due)
    }

    async fn update_status(
        &self,
        event_id: ClubEventId,
        expected: ClubEventStatus,
        next: ClubEventStatus,
    ) -> AppResult<bool> {
        let mut events = self.events.write().await;
        let Some(event) = events.get_mut(&event_id) else {
            return Ok(false);
        };

        if event.status() != expected {
            return Ok(false);
        }

        event.transition_to(next)?;
        Ok(true)
    }
}
