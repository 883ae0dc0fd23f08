use std::env;
use std::str::FromStr;

use divehub_application::{
    DEFAULT_AUDIT_RETENTION_DAYS, EmailQueueSettings, MAX_AUDIT_RETENTION_DAYS,
};
use divehub_core::{AppError, AppResult};
use divehub_infrastructure::SmtpEmailConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpRuntimeConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl From<SmtpRuntimeConfig> for SmtpEmailConfig {
    fn from(value: SmtpRuntimeConfig) -> Self {
        Self {
            host: value.host,
            port: value.port,
            username: value.username,
            password: value.password,
            from_address: value.from_address,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailProviderConfig {
    Console,
    Smtp(SmtpRuntimeConfig),
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub database_max_connections: u32,
    pub audit_retention_days: u32,
    pub email_queue: EmailQueueSettings,
    pub email_provider: EmailProviderConfig,
}

impl WorkerConfig {
    pub fn load() -> AppResult<Self> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    fn from_lookup<F>(migrate_only: bool, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = required_non_empty(&lookup, "DATABASE_URL")?;
        let database_max_connections = parse_setting(&lookup, "DATABASE_MAX_CONNECTIONS", 5_u32)?;
        let audit_retention_days =
            parse_setting(&lookup, "AUDIT_RETENTION_DAYS", DEFAULT_AUDIT_RETENTION_DAYS)?;
        let defaults = EmailQueueSettings::default();
        let email_queue = EmailQueueSettings {
            batch_size: parse_setting(&lookup, "EMAIL_FLUSH_BATCH_SIZE", defaults.batch_size)?,
            max_attempts: parse_setting(&lookup, "EMAIL_MAX_ATTEMPTS", defaults.max_attempts)?,
            lease_seconds: parse_setting(&lookup, "EMAIL_LEASE_SECONDS", defaults.lease_seconds)?,
        };

        for (name, value) in [
            ("DATABASE_MAX_CONNECTIONS", u64::from(database_max_connections)),
            ("AUDIT_RETENTION_DAYS", u64::from(audit_retention_days)),
            ("EMAIL_FLUSH_BATCH_SIZE", email_queue.batch_size as u64),
            ("EMAIL_MAX_ATTEMPTS", u64::from(email_queue.max_attempts)),
            ("EMAIL_LEASE_SECONDS", u64::from(email_queue.lease_seconds)),
        ] {
            if value == 0 {
                return Err(AppError::Validation(format!("{name} must be greater than zero")));
            }
        }

        if audit_retention_days > MAX_AUDIT_RETENTION_DAYS {
            return Err(AppError::Validation(format!(
                "AUDIT_RETENTION_DAYS must not exceed {MAX_AUDIT_RETENTION_DAYS}"
            )));
        }

        let email_provider = match lookup("EMAIL_PROVIDER")
            .unwrap_or_else(|| "console".to_owned())
            .trim()
        {
            "console" => EmailProviderConfig::Console,
            "smtp" => {
                let port = required_non_empty(&lookup, "SMTP_PORT")?
                    .parse::<u16>()
                    .map_err(|error| AppError::Validation(format!("invalid SMTP_PORT: {error}")))?;
                EmailProviderConfig::Smtp(SmtpRuntimeConfig {
                    host: required_non_empty(&lookup, "SMTP_HOST")?,
                    port,
                    username: lookup("SMTP_USERNAME").unwrap_or_default(),
                    password: lookup("SMTP_PASSWORD").unwrap_or_default(),
                    from_address: required_non_empty(&lookup, "SMTP_FROM_ADDRESS")?,
                })
            }
            other => {
                return Err(AppError::Validation(format!(
                    "EMAIL_PROVIDER must be either 'console' or 'smtp', got '{other}'"
                )));
            }
        };

        Ok(Self {
            migrate_only,
            database_url,
            database_max_connections,
            audit_retention_days,
            email_queue,
            email_provider,
        })
    }
}

fn required_non_empty<F>(lookup: &F, name: &str) -> AppResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parse_setting<F, T>(lookup: &F, name: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        None => Ok(default),
    }
}
