//! SMTP email delivery using the `lettre` crate.

use async_trait::async_trait;
use divehub_application::EmailService;
use divehub_core::{AppError, AppResult};
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// SMTP relay settings.
#[derive(Clone)]
pub struct SmtpEmailConfig {
    /// SMTP relay hostname.
    pub host: String,
    /// SMTP relay port.
    pub port: u16,
    /// Login name. Empty disables authentication.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Sender mailbox, e.g. `DiveHub <noreply@divehub.example>`.
    pub from_address: String,
}

/// Email service that hands messages to an SMTP relay.
#[derive(Clone)]
pub struct SmtpEmailService {
    sender: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailService {
    /// Builds the relay transport and validates the sender mailbox.
    pub fn new(config: SmtpEmailConfig) -> AppResult<Self> {
        let sender = config.from_address.parse::<Mailbox>().map_err(|error| {
            AppError::Validation(format!(
                "invalid SMTP sender address '{}': {error}",
                config.from_address
            ))
        })?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to create SMTP transport for '{}': {error}",
                    config.host
                ))
            })?
            .port(config.port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(config.username, config.password));
        }

        Ok(Self {
            sender,
            transport: builder.build(),
        })
    }

    fn build_message(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<Message> {
        let recipient = to.parse::<Mailbox>().map_err(|error| {
            AppError::Validation(format!("invalid recipient address '{to}': {error}"))
        })?;

        let builder = Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(subject);

        let message = match html_body {
            Some(html_body) => builder.multipart(MultiPart::alternative_plain_html(
                text_body.to_owned(),
                html_body.to_owned(),
            )),
            None => builder.singlepart(SinglePart::plain(text_body.to_owned())),
        };

        message.map_err(|error| AppError::Internal(format!("failed to build email: {error}")))
    }
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<()> {
        let message = self.build_message(to, subject, text_body, html_body)?;

        self.transport.send(message).await.map_err(|error| {
            AppError::Internal(format!("failed to send email to '{to}': {error}"))
        })?;

        Ok(())
    }
}
