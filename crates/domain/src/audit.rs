use divehub_core::{AppResult, AuditLevel, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Name of the subsystem that emits audit events, one per operation group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditSource(NonEmptyString);

impl AuditSource {
    /// Creates a validated audit source name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        Ok(Self(NonEmptyString::new(value)?))
    }

    /// Returns the source name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for AuditSource {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Declared audit messages for one operation.
///
/// An absent fail message means unexpected failures of the operation are not
/// written to the audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    start_message: NonEmptyString,
    ok_message: NonEmptyString,
    fail_message: Option<NonEmptyString>,
    level: AuditLevel,
}

impl OperationDescriptor {
    /// Creates a descriptor at [`AuditLevel::Info`] without a fail message.
    pub fn new(start_message: impl Into<String>, ok_message: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            start_message: NonEmptyString::new(start_message)?,
            ok_message: NonEmptyString::new(ok_message)?,
            fail_message: None,
            level: AuditLevel::Info,
        })
    }

    /// Sets the fail message. Empty or whitespace values leave it absent.
    #[must_use]
    pub fn with_fail_message(mut self, fail_message: impl Into<String>) -> Self {
        self.fail_message = NonEmptyString::new(fail_message).ok();
        self
    }

    /// Sets the level attached to every event of the operation.
    #[must_use]
    pub fn with_level(mut self, level: AuditLevel) -> Self {
        self.level = level;
        self
    }

    /// Returns the message recorded when the operation starts.
    #[must_use]
    pub fn start_message(&self) -> &str {
        self.start_message.as_str()
    }

    /// Returns the message recorded when the operation succeeds.
    #[must_use]
    pub fn ok_message(&self) -> &str {
        self.ok_message.as_str()
    }

    /// Returns the message recorded on unexpected failure, if declared.
    #[must_use]
    pub fn fail_message(&self) -> Option<&str> {
        self.fail_message.as_ref().map(NonEmptyString::as_str)
    }

    /// Returns the declared level.
    #[must_use]
    pub fn level(&self) -> AuditLevel {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use divehub_core::AuditLevel;
    use proptest::prelude::*;

    use super::{AuditSource, OperationDescriptor};

    #[test]
    fn audit_source_rejects_blank_names() {
        assert!(AuditSource::new("  ").is_err());
        assert_eq!(
            AuditSource::new("events").map(|source| source.to_string()).ok(),
            Some("events".to_owned())
        );
    }

    #[test]
    fn descriptor_defaults_to_info_without_fail_message() {
        let descriptor = OperationDescriptor::new("cancelling event", "event cancelled");
        assert!(descriptor.is_ok());
        let Ok(descriptor) = descriptor else {
            return;
        };

        assert_eq!(descriptor.level(), AuditLevel::Info);
        assert_eq!(descriptor.fail_message(), None);
    }

    #[test]
    fn descriptor_keeps_declared_fail_message_and_level() {
        let descriptor = OperationDescriptor::new("uploading log", "log uploaded")
            .map(|descriptor| {
                descriptor
                    .with_fail_message("log upload failed")
                    .with_level(AuditLevel::Warn)
            });

        let Ok(descriptor) = descriptor else {
            panic!("descriptor should be valid");
        };
        assert_eq!(descriptor.fail_message(), Some("log upload failed"));
        assert_eq!(descriptor.level(), AuditLevel::Warn);
    }

    proptest! {
        #[test]
        fn blank_fail_messages_are_treated_as_absent(padding in "[ \t\n]{0,8}") {
            let descriptor = OperationDescriptor::new("start", "ok")
                .map(|descriptor| descriptor.with_fail_message(padding));
            prop_assert!(descriptor.is_ok());
            prop_assert_eq!(descriptor.ok().and_then(|d| d.fail_message().map(str::to_owned)), None);
        }
    }
}
