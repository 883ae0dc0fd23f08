//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_email_service;
mod in_memory_audit_repository;
mod in_memory_club_event_repository;
mod postgres_audit_log_repository;
mod postgres_audit_repository;
mod postgres_club_event_repository;
mod postgres_email_queue_repository;
mod smtp_email_service;
#[cfg(test)]
mod test_support;

use sqlx::migrate::Migrator;

pub use console_email_service::ConsoleEmailService;
pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_club_event_repository::InMemoryClubEventRepository;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_club_event_repository::PostgresClubEventRepository;
pub use postgres_email_queue_repository::PostgresEmailQueueRepository;
pub use smtp_email_service::{SmtpEmailConfig, SmtpEmailService};

/// Embedded schema migrations for the audit, club event and email queue tables.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");
