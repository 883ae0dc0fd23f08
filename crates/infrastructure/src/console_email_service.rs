//! Console email delivery for local runs. Queued mail ends up in the tracing output.

use async_trait::async_trait;
use divehub_application::EmailService;
use divehub_core::AppResult;
use tracing::info;

/// Email service that writes each delivered message to the log.
#[derive(Clone, Debug, Default)]
pub struct ConsoleEmailService;

impl ConsoleEmailService {
    /// Creates a new console email service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<()> {
        info!(
            to,
            subject,
            has_html = html_body.is_some(),
            body = text_body,
            "delivered queued email to console"
        );

        Ok(())
    }
}
