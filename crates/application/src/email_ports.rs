use async_trait::async_trait;

use divehub_core::AppResult;
use divehub_domain::{EmailAddress, EmailClaimToken, QueuedEmailId, QueuedEmailStatus};

/// Port for email delivery.
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Sends a plain-text or HTML email.
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<()>;
}

/// Email waiting in the outgoing queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQueuedEmail {
    /// Validated recipient.
    pub recipient: EmailAddress,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text_body: String,
}

/// Queued email claimed for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedEmail {
    /// Stable email identifier.
    pub email_id: QueuedEmailId,
    /// Recipient address.
    pub recipient: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text_body: String,
    /// Delivery attempts made before this claim.
    pub attempts: u32,
    /// Token of the claim that leased this email.
    pub claim_token: EmailClaimToken,
}

/// Repository port for the outgoing email queue.
#[async_trait]
pub trait EmailQueueRepository: Send + Sync {
    /// Appends an email in pending status.
    async fn enqueue_email(&self, email: NewQueuedEmail) -> AppResult<QueuedEmailId>;

    /// Claims up to `limit` pending emails, oldest first.
    ///
    /// Claimed emails are leased for `lease_seconds` so a concurrent flush
    /// does not pick them up again.
    async fn claim_pending_emails(
        &self,
        limit: usize,
        lease_seconds: u32,
    ) -> AppResult<Vec<QueuedEmail>>;

    /// Marks a claimed email as sent.
    ///
    /// Returns `false` when `claim_token` no longer holds the email, which
    /// happens once its lease expired and another flush claimed it.
    async fn mark_sent(
        &self,
        email_id: QueuedEmailId,
        claim_token: EmailClaimToken,
    ) -> AppResult<bool>;

    /// Records a failed delivery attempt and returns the resulting status.
    ///
    /// The email becomes [`QueuedEmailStatus::Failed`] once `max_attempts`
    /// attempts have been made, otherwise it returns to pending. Returns
    /// `None` when `claim_token` no longer holds the email.
    async fn record_failure(
        &self,
        email_id: QueuedEmailId,
        claim_token: EmailClaimToken,
        error: &str,
        max_attempts: u32,
    ) -> AppResult<Option<QueuedEmailStatus>>;
}
