//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod club_event;
mod email;

pub use audit::{AuditSource, OperationDescriptor};
pub use club_event::{ClubEvent, ClubEventId, ClubEventInput, ClubEventStatus};
pub use email::{EmailAddress, EmailClaimToken, QueuedEmailId, QueuedEmailStatus};
