//! Outgoing email domain types.

use std::str::FromStr;

use divehub_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a queued email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueuedEmailId(Uuid);

impl QueuedEmailId {
    /// Creates a new random email identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an email identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for QueuedEmailId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for QueuedEmailId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Token identifying one claim of a queued email.
///
/// Every claim issues a fresh token, so a flush whose lease expired can no
/// longer settle an email another flush has claimed since.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailClaimToken(Uuid);

impl EmailClaimToken {
    /// Creates a new random claim token.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a claim token from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EmailClaimToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || domain.contains('@') || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.' and no '@'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Delivery status of a queued email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuedEmailStatus {
    /// Waiting for the next queue flush.
    Pending,
    /// Delivered to the mail transport.
    Sent,
    /// Gave up after exhausting delivery attempts.
    Failed,
}

impl QueuedEmailStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for QueuedEmailStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            _ => Err(AppError::Validation(format!(
                "unknown queued email status '{value}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{EmailAddress, QueuedEmailStatus};

    #[test]
    fn email_address_is_normalized() {
        let address = EmailAddress::new("  Diver@Club.Example ");
        assert_eq!(
            address.map(String::from).ok(),
            Some("diver@club.example".to_owned())
        );
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        for value in ["", "diver", "@club.example", "diver@club", "a@b@club.example"] {
            assert!(EmailAddress::new(value).is_err(), "{value} should be rejected");
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(QueuedEmailStatus::from_str("bounced").is_err());
        assert_eq!(
            QueuedEmailStatus::from_str("pending").ok(),
            Some(QueuedEmailStatus::Pending)
        );
    }
}
