//! Periodic maintenance jobs.
//!
//! Every job is driven by its own [`JobRunner`]. A runner holds a single-slot
//! run guard, so at most one execution of a job is in flight at a time while
//! different jobs run independently of each other.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use divehub_core::AppResult;

mod jobs;

pub use jobs::{AuditTrailCleanupSchedule, ClosingEventSchedule, EmailQueueSchedule};

/// Timer configuration of a periodic job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSchedule {
    /// Time between consecutive timer fires.
    pub period: Duration,
    /// Wait before the first fire, if any.
    pub initial_delay: Option<Duration>,
}

/// Result of one successful job execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobReport {
    /// Rows or messages the run acted on.
    pub processed: u64,
}

/// Periodic maintenance task.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    /// Stable job name used in logs.
    fn name(&self) -> &'static str;

    /// Timer configuration.
    fn schedule(&self) -> JobSchedule;

    /// Executes one run.
    async fn run(&self) -> AppResult<JobReport>;
}

/// Outcome of one timer fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRunOutcome {
    /// The run finished.
    Completed(JobReport),
    /// The run failed; the next timer fire runs the job again.
    Failed(String),
    /// Another run of the same job was still in flight.
    Skipped,
}

/// Drives one [`ScheduledJob`] and serializes its executions.
#[derive(Clone)]
pub struct JobRunner {
    job: Arc<dyn ScheduledJob>,
    run_guard: Arc<Mutex<()>>,
}

impl JobRunner {
    /// Creates a runner for `job`.
    #[must_use]
    pub fn new(job: Arc<dyn ScheduledJob>) -> Self {
        Self {
            job,
            run_guard: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the job name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.job.name()
    }

    /// Returns whether a run is currently in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run_guard.try_lock().is_err()
    }

    /// Waits until the run in flight, if any, has finished.
    ///
    /// Used on shutdown after the timer loop is aborted; a started run is never
    /// cut short.
    pub async fn wait_idle(&self) {
        let _idle = self.run_guard.lock().await;
    }

    /// Executes the job once unless a run is already in flight.
    ///
    /// The run executes on its own task that owns the run guard, so a panic
    /// inside the job ends that run only and dropping the returned future does
    /// not let a second run start while the first is still going.
    pub async fn run_once(&self) -> JobRunOutcome {
        let job_name = self.job.name();
        let Ok(running) = Arc::clone(&self.run_guard).try_lock_owned() else {
            warn!(job = job_name, "previous run still in flight, skipping");
            return JobRunOutcome::Skipped;
        };

        info!(job = job_name, "scheduled job started");
        let job = Arc::clone(&self.job);
        let run = tokio::spawn(async move {
            let _running = running;
            let started = Instant::now();
            let result = job.run().await;
            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            match result {
                Ok(report) => {
                    info!(
                        job = job_name,
                        processed = report.processed,
                        elapsed_ms,
                        "scheduled job finished"
                    );
                    JobRunOutcome::Completed(report)
                }
                Err(error) => {
                    error!(job = job_name, elapsed_ms, error = %error, "scheduled job failed");
                    JobRunOutcome::Failed(error.to_string())
                }
            }
        });

        match run.await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                error!(job = job_name, error = %join_error, "scheduled job aborted");
                JobRunOutcome::Failed(format!("job task aborted: {join_error}"))
            }
        }
    }

    /// Spawns the timer loop for this job.
    ///
    /// Fires missed while a run was in flight are skipped rather than queued.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let schedule = self.job.schedule();
            info!(
                job = self.name(),
                period_secs = schedule.period.as_secs(),
                initial_delay_secs = schedule.initial_delay.map(|delay| delay.as_secs()),
                "scheduled job registered"
            );

            if let Some(delay) = schedule.initial_delay {
                tokio::time::sleep(delay).await;
            }

            let mut interval = tokio::time::interval(schedule.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                self.run_once().await;
            }
        })
    }
}
