use async_trait::async_trait;
use chrono::{DateTime, Utc};

use divehub_core::AppResult;
use divehub_domain::{ClubEvent, ClubEventId, ClubEventStatus};

/// Repository port for club event persistence.
#[async_trait]
pub trait ClubEventRepository: Send + Sync {
    /// Inserts a new event.
    async fn save_event(&self, event: ClubEvent) -> AppResult<()>;

    /// Finds one event by id.
    async fn find_event(&self, event_id: ClubEventId) -> AppResult<Option<ClubEvent>>;

    /// Lists open events whose scheduled end is at or before `now`.
    async fn list_events_due_for_closing(&self, now: DateTime<Utc>) -> AppResult<Vec<ClubEvent>>;

    /// Sets the status of one event if it currently has status `expected`.
    ///
    /// Returns `false` when no row matched, which makes repeated updates no-ops.
    async fn update_status(
        &self,
        event_id: ClubEventId,
        expected: ClubEventStatus,
        next: ClubEventStatus,
    ) -> AppResult<bool>;
}
