use std::str::FromStr;

use chrono::{DateTime, Utc};
use divehub_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a club event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClubEventId(Uuid);

impl ClubEventId {
    /// Creates a new random event identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an event identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ClubEventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClubEventId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Lifecycle status of a club event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClubEventStatus {
    /// Scheduled and accepting participants.
    Open,
    /// The scheduled occurrence has fully elapsed.
    Held,
    /// Called off before it took place.
    Cancelled,
}

impl ClubEventStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Held => "held",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns whether a transition to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!((self, next), (Self::Open, Self::Held | Self::Cancelled))
    }
}

impl FromStr for ClubEventStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "open" => Ok(Self::Open),
            "held" => Ok(Self::Held),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(AppError::Validation(format!(
                "unknown club event status '{value}'"
            ))),
        }
    }
}

/// Input payload used to construct a validated club event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClubEventInput {
    /// User-facing event title.
    pub title: String,
    /// Scheduled start.
    pub starts_at: DateTime<Utc>,
    /// Scheduled end.
    pub ends_at: DateTime<Utc>,
}

/// Scheduled club activity such as a dive trip or a training session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubEvent {
    event_id: ClubEventId,
    title: NonEmptyString,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    status: ClubEventStatus,
}

impl ClubEvent {
    /// Creates a new open event.
    pub fn new(input: ClubEventInput) -> AppResult<Self> {
        Self::restore(ClubEventId::new(), input, ClubEventStatus::Open)
    }

    /// Rebuilds a persisted event.
    pub fn restore(
        event_id: ClubEventId,
        input: ClubEventInput,
        status: ClubEventStatus,
    ) -> AppResult<Self> {
        let ClubEventInput {
            title,
            starts_at,
            ends_at,
        } = input;

        if ends_at < starts_at {
            return Err(AppError::Validation(format!(
                "event end '{ends_at}' must not precede its start '{starts_at}'"
            )));
        }

        Ok(Self {
            event_id,
            title: NonEmptyString::new(title)?,
            starts_at,
            ends_at,
            status,
        })
    }

    /// Returns the event identifier.
    #[must_use]
    pub fn event_id(&self) -> ClubEventId {
        self.event_id
    }

    /// Returns the event title.
    #[must_use]
    pub fn title(&self) -> &NonEmptyString {
        &self.title
    }

    /// Returns the scheduled start.
    #[must_use]
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    /// Returns the scheduled end.
    #[must_use]
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ClubEventStatus {
        self.status
    }

    /// Returns whether the scheduled occurrence has fully elapsed at `now`.
    #[must_use]
    pub fn has_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.ends_at <= now
    }

    /// Returns whether the closing job should mark this event as held.
    #[must_use]
    pub fn is_due_for_closing(&self, now: DateTime<Utc>) -> bool {
        self.status == ClubEventStatus::Open && self.has_elapsed(now)
    }

    /// Moves the event to `next`, rejecting transitions out of a final status.
    pub fn transition_to(&mut self, next: ClubEventStatus) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "event '{}' cannot move from '{}' to '{}'",
                self.event_id,
                self.status.as_str(),
                next.as_str()
            )));
        }

        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    use super::{ClubEvent, ClubEventInput, ClubEventStatus};

    fn event_ending_at_offset(minutes: i64) -> ClubEvent {
        let ends_at = Utc
            .with_ymd_and_hms(2026, 6, 1, 12, 0, 0)
            .single()
            .unwrap_or_default()
            + Duration::minutes(minutes);
        let built = ClubEvent::new(ClubEventInput {
            title: "Wreck dive".to_owned(),
            starts_at: ends_at - Duration::hours(2),
            ends_at,
        });
        match built {
            Ok(event) => event,
            Err(error) => panic!("event should be valid: {error}"),
        }
    }

    #[test]
    fn end_before_start_is_rejected() {
        let now = Utc::now();
        let result = ClubEvent::new(ClubEventInput {
            title: "Night dive".to_owned(),
            starts_at: now,
            ends_at: now - Duration::minutes(1),
        });
        assert!(result.is_err());
    }

    #[test]
    fn only_open_events_transition() {
        let mut event = event_ending_at_offset(0);
        assert!(event.transition_to(ClubEventStatus::Held).is_ok());
        assert!(event.transition_to(ClubEventStatus::Cancelled).is_err());
        assert_eq!(event.status(), ClubEventStatus::Held);
    }

    #[test]
    fn status_roundtrips_storage_value() {
        for status in [
            ClubEventStatus::Open,
            ClubEventStatus::Held,
            ClubEventStatus::Cancelled,
        ] {
            assert_eq!(ClubEventStatus::from_str(status.as_str()).ok(), Some(status));
        }
    }

    proptest! {
        #[test]
        fn due_for_closing_exactly_when_end_has_passed(offset in -600_i64..600) {
            let event = event_ending_at_offset(0);
            let now = event.ends_at() + Duration::seconds(offset);
            prop_assert_eq!(event.is_due_for_closing(now), offset >= 0);
        }
    }
}
