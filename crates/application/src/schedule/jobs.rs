use std::time::Duration;

use async_trait::async_trait;

use divehub_core::AppResult;

use crate::audit_event_service::AuditEventService;
use crate::club_event_service::ClubEventService;
use crate::email_queue_service::EmailQueueService;

use super::{JobReport, JobSchedule, ScheduledJob};

const MINUTE: Duration = Duration::from_secs(60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Marks elapsed open events as held.
#[derive(Clone)]
pub struct ClosingEventSchedule {
    service: ClubEventService,
}

impl ClosingEventSchedule {
    /// Every 30 minutes, first run immediately.
    pub const SCHEDULE: JobSchedule = JobSchedule {
        period: Duration::from_secs(30 * MINUTE.as_secs()),
        initial_delay: None,
    };

    /// Creates the job.
    #[must_use]
    pub fn new(service: ClubEventService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ScheduledJob for ClosingEventSchedule {
    fn name(&self) -> &'static str {
        "closing_event_schedule"
    }

    fn schedule(&self) -> JobSchedule {
        Self::SCHEDULE
    }

    async fn run(&self) -> AppResult<JobReport> {
        let transitioned = self.service.close_elapsed_events().await?;
        Ok(JobReport {
            processed: u64::try_from(transitioned).unwrap_or(u64::MAX),
        })
    }
}

/// Delivers queued emails.
#[derive(Clone)]
pub struct EmailQueueSchedule {
    service: EmailQueueService,
}

impl EmailQueueSchedule {
    /// Every 15 minutes, first run immediately.
    pub const SCHEDULE: JobSchedule = JobSchedule {
        period: Duration::from_secs(15 * MINUTE.as_secs()),
        initial_delay: None,
    };

    /// Creates the job.
    #[must_use]
    pub fn new(service: EmailQueueService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ScheduledJob for EmailQueueSchedule {
    fn name(&self) -> &'static str {
        "email_queue_schedule"
    }

    fn schedule(&self) -> JobSchedule {
        Self::SCHEDULE
    }

    async fn run(&self) -> AppResult<JobReport> {
        let summary = self.service.flush_queue().await?;
        Ok(JobReport {
            processed: u64::try_from(summary.sent).unwrap_or(u64::MAX),
        })
    }
}

/// Purges audit events past the retention window.
#[derive(Clone)]
pub struct AuditTrailCleanupSchedule {
    service: AuditEventService,
}

impl AuditTrailCleanupSchedule {
    /// Every 24 hours, first run after 24 hours.
    pub const SCHEDULE: JobSchedule = JobSchedule {
        period: DAY,
        initial_delay: Some(DAY),
    };

    /// Creates the job.
    #[must_use]
    pub fn new(service: AuditEventService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ScheduledJob for AuditTrailCleanupSchedule {
    fn name(&self) -> &'static str {
        "audit_trail_cleanup_schedule"
    }

    fn schedule(&self) -> JobSchedule {
        Self::SCHEDULE
    }

    async fn run(&self) -> AppResult<JobReport> {
        let deleted = self.service.cleanup_audit_trail().await?;
        Ok(JobReport { processed: deleted })
    }
}
