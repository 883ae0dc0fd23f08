//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_event_service;
mod audit_interceptor;
mod audit_ports;
mod club_event_ports;
mod club_event_service;
mod email_ports;
mod email_queue_service;
mod schedule;
mod trace_context;

pub use audit_event_service::{
    AuditEventService, DEFAULT_AUDIT_RETENTION_DAYS, MAX_AUDIT_RETENTION_DAYS,
};
pub use audit_interceptor::AuditInterceptor;
pub use audit_ports::{
    AUDIT_LOG_MAX_LIMIT, AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository,
    AuditRepository,
};
pub use club_event_ports::ClubEventRepository;
pub use club_event_service::{CLUB_EVENT_AUDIT_SOURCE, ClubEventService};
pub use email_ports::{EmailQueueRepository, EmailService, NewQueuedEmail, QueuedEmail};
pub use email_queue_service::{EmailFlushSummary, EmailQueueService, EmailQueueSettings};
pub use schedule::{
    AuditTrailCleanupSchedule, ClosingEventSchedule, EmailQueueSchedule, JobReport,
    JobRunOutcome, JobRunner, JobSchedule, ScheduledJob,
};
pub use trace_context::{TraceContext, TraceGuard};
