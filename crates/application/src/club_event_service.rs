use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use divehub_core::{AppError, AppResult, AuditFailure};
use divehub_domain::{
    AuditSource, ClubEvent, ClubEventId, ClubEventInput, ClubEventStatus, OperationDescriptor,
};

use crate::audit_interceptor::AuditInterceptor;
use crate::audit_ports::AuditRepository;
use crate::club_event_ports::ClubEventRepository;


/// Audit source name used by club event operations.
pub const CLUB_EVENT_AUDIT_SOURCE: &str = "events";

/// Application service for club event lifecycle.
#[derive(Clone)]
pub struct ClubEventService {
    repository: Arc<dyn ClubEventRepository>,
    audit: AuditInterceptor,
    create_descriptor: OperationDescriptor,
    cancel_descriptor: OperationDescriptor,
}

impl ClubEventService {
    /// Creates a service from repository implementations.
    pub fn new(
        repository: Arc<dyn ClubEventRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> AppResult<Self> {
        let audit = AuditInterceptor::new(
            AuditSource::new(CLUB_EVENT_AUDIT_SOURCE)?,
            audit_repository,
        );

        Ok(Self {
            repository,
            audit,
            create_descriptor: OperationDescriptor::new("creating event", "event created")?,
            cancel_descriptor: OperationDescriptor::new("cancelling event", "event cancelled")?
                .with_fail_message("event cancellation failed"),
        })
    }

    /// Creates and persists an open event.
    pub async fn create_event(&self, input: ClubEventInput) -> AppResult<ClubEvent> {
        self.audit
            .intercept(&self.create_descriptor, async {
                let event = ClubEvent::new(input)?;
                self.repository.save_event(event.clone()).await?;
                Ok(event)
            })
            .await
    }

    /// Cancels an open event.
    ///
    /// Events that are already held or cancelled fail with an audit failure.
    pub async fn cancel_event(&self, event_id: ClubEventId) -> AppResult<ClubEvent> {
        self.audit
            .intercept(&self.cancel_descriptor, async {
                let mut event = self
                    .repository
                    .find_event(event_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("event '{event_id}'")))?;

                let not_cancellable = || {
                    AppError::from(AuditFailure::warn(format!(
                        "event {event_id} cannot be cancelled"
                    )))
                };

                if event.status() != ClubEventStatus::Open {
                    return Err(not_cancellable());
                }

                let updated = self
                    .repository
                    .update_status(event_id, ClubEventStatus::Open, ClubEventStatus::Cancelled)
                    .await?;
                if !updated {
                    return Err(not_cancellable());
                }

                event.transition_to(ClubEventStatus::Cancelled)?;
                Ok(event)
            })
            .await
    }

    /// Marks every open event whose scheduled end has passed as held.
    ///
    /// The candidate set is read once; rows changed concurrently are skipped
    /// by the guarded status update. Returns the number of events transitioned.
    pub async fn close_elapsed_events(&self) -> AppResult<usize> {
        let now = Utc::now();
        let candidates = self.repository.list_events_due_for_closing(now).await?;

        let mut transitioned = 0_usize;
        for event in candidates.iter().filter(|event| event.is_due_for_closing(now)) {
            let updated = self
                .repository
                .update_status(event.event_id(), ClubEventStatus::Open, ClubEventStatus::Held)
                .await?;

            if updated {
                transitioned = transitioned.saturating_add(1);
            } else {
                debug!(event_id = %event.event_id(), "event changed before it could be closed");
            }
        }

        info!(
            candidates = candidates.len(),
            transitioned, "closed elapsed club events"
        );

        Ok(transitioned)
    }
}
