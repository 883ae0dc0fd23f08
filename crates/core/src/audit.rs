use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AppError;

/// Ordered audit severity.
///
/// Used to filter and report audit events. Never drives control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditLevel {
    /// Routine activity.
    Info,
    /// Expected but noteworthy outcome.
    Warn,
    /// Failed operation.
    Error,
}

impl AuditLevel {
    /// Returns a stable storage value for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl Display for AuditLevel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for AuditLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(AppError::Validation(format!(
                "unknown audit level value '{value}'"
            ))),
        }
    }
}

/// Expected failure that describes its own audit payload.
///
/// Returned through [`AppError::Audit`]. The audit trail records `message` and
/// `level` as given instead of the failing operation's declared fail message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditFailure {
    message: String,
    level: AuditLevel,
}

impl AuditFailure {
    /// Creates a failure with an explicit audit level.
    #[must_use]
    pub fn new(message: impl Into<String>, level: AuditLevel) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }

    /// Creates a failure recorded at [`AuditLevel::Warn`].
    #[must_use]
    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(message, AuditLevel::Warn)
    }

    /// Returns the audit message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns the audit level.
    #[must_use]
    pub fn level(&self) -> AuditLevel {
        self.level
    }
}

impl Display for AuditFailure {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.message.as_str())
    }
}
