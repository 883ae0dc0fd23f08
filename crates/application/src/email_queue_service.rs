//! Outgoing email queue.
//!
//! Emails are written to the queue by request handling and delivered in
//! batches by the periodic flush.

use std::sync::Arc;

use tracing::{info, warn};

use divehub_core::{AppError, AppResult, NonEmptyString};
use divehub_domain::{EmailAddress, QueuedEmailId, QueuedEmailStatus};

use crate::email_ports::{EmailQueueRepository, EmailService, NewQueuedEmail};


/// Tuning values for queue flushing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailQueueSettings {
    /// Maximum emails delivered per flush.
    pub batch_size: usize,
    /// Delivery attempts before an email is marked failed.
    pub max_attempts: u32,
    /// Lease applied to claimed emails.
    pub lease_seconds: u32,
}

impl Default for EmailQueueSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            max_attempts: 5,
            lease_seconds: 300,
        }
    }
}

/// Outcome counters for one queue flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmailFlushSummary {
    /// Emails claimed from the queue.
    pub claimed: usize,
    /// Emails delivered.
    pub sent: usize,
    /// Emails returned to pending after a failed attempt.
    pub retried: usize,
    /// Emails that exhausted their attempts.
    pub failed: usize,
    /// Emails whose lease expired before the outcome could be recorded.
    pub lease_lost: usize,
}

/// Application service for the outgoing email queue.
#[derive(Clone)]
pub struct EmailQueueService {
    repository: Arc<dyn EmailQueueRepository>,
    email_service: Arc<dyn EmailService>,
    settings: EmailQueueSettings,
}

impl EmailQueueService {
    /// Creates a service from repository and delivery implementations.
    pub fn new(
        repository: Arc<dyn EmailQueueRepository>,
        email_service: Arc<dyn EmailService>,
        settings: EmailQueueSettings,
    ) -> AppResult<Self> {
        if settings.batch_size == 0 {
            return Err(AppError::Validation(
                "email flush batch size must be greater than zero".to_owned(),
            ));
        }

        if settings.max_attempts == 0 {
            return Err(AppError::Validation(
                "email max attempts must be greater than zero".to_owned(),
            ));
        }

        if settings.lease_seconds == 0 {
            return Err(AppError::Validation(
                "email lease must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            repository,
            email_service,
            settings,
        })
    }

    /// Validates and queues an email for the next flush.
    pub async fn enqueue(
        &self,
        recipient: &str,
        subject: &str,
        text_body: &str,
    ) -> AppResult<QueuedEmailId> {
        let email = NewQueuedEmail {
            recipient: EmailAddress::new(recipient)?,
            subject: NonEmptyString::new(subject)?.into(),
            text_body: text_body.to_owned(),
        };

        self.repository.enqueue_email(email).await
    }

    /// Delivers one batch of pending emails.
    ///
    /// A failed delivery is recorded against that email only. The claim is
    /// committed up front and each outcome is committed on its own, so a
    /// repository failure aborts the flush without undoing earlier outcomes.
    pub async fn flush_queue(&self) -> AppResult<EmailFlushSummary> {
        let claimed = self
            .repository
            .claim_pending_emails(self.settings.batch_size, self.settings.lease_seconds)
            .await?;

        let mut summary = EmailFlushSummary {
            claimed: claimed.len(),
            ..EmailFlushSummary::default()
        };

        for email in claimed {
            let delivery = self
                .email_service
                .send_email(
                    email.recipient.as_str(),
                    email.subject.as_str(),
                    email.text_body.as_str(),
                    None,
                )
                .await;

            match delivery {
                Ok(()) => {
                    if self
                        .repository
                        .mark_sent(email.email_id, email.claim_token)
                        .await?
                    {
                        summary.sent += 1;
                    } else {
                        warn!(
                            email_id = %email.email_id,
                            "email lease expired before delivery was recorded"
                        );
                        summary.lease_lost += 1;
                    }
                }
                Err(error) => {
                    let error_text = error.to_string();
                    let Some(status) = self
                        .repository
                        .record_failure(
                            email.email_id,
                            email.claim_token,
                            error_text.as_str(),
                            self.settings.max_attempts,
                        )
                        .await?
                    else {
                        warn!(
                            email_id = %email.email_id,
                            error = %error_text,
                            "email lease expired before the failed attempt was recorded"
                        );
                        summary.lease_lost += 1;
                        continue;
                    };

                    warn!(
                        email_id = %email.email_id,
                        attempts = email.attempts.saturating_add(1),
                        status = status.as_str(),
                        error = %error_text,
                        "queued email delivery failed"
                    );

                    if status == QueuedEmailStatus::Failed {
                        summary.failed += 1;
                    } else {
                        summary.retried += 1;
                    }
                }
            }
        }

        info!(
            claimed = summary.claimed,
            sent = summary.sent,
            retried = summary.retried,
            failed = summary.failed,
            lease_lost = summary.lease_lost,
            "email queue flushed"
        );

        Ok(summary)
    }
}
