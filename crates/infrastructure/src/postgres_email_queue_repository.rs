use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use divehub_application::{EmailQueueRepository, NewQueuedEmail, QueuedEmail};
use divehub_core::{AppError, AppResult};
use divehub_domain::{EmailClaimToken, QueuedEmailId, QueuedEmailStatus};

#[cfg(test)]
mod tests;

/// PostgreSQL-backed outgoing email queue.
#[derive(Clone)]
pub struct PostgresEmailQueueRepository {
    pool: PgPool,
}

impl PostgresEmailQueueRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ClaimedEmailRow {
    id: uuid::Uuid,
    recipient: String,
    subject: String,
    text_body: String,
    attempts: i32,
    claim_token: uuid::Uuid,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl EmailQueueRepository for PostgresEmailQueueRepository {
    async fn enqueue_email(&self, email: NewQueuedEmail) -> AppResult<QueuedEmailId> {
        let email_id = QueuedEmailId::new();

        sqlx::query(
            r#"
            INSERT INTO email_queue (
                id,
                recipient,
                subject,
                text_body,
                status,
                created_at
            )
            VALUES ($1, $2, $3, $4, 'pending', now())
            "#,
        )
        .bind(email_id.as_uuid())
        .bind(email.recipient.as_str())
        .bind(email.subject)
        .bind(email.text_body)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to enqueue email: {error}")))?;

        Ok(email_id)
    }

    async fn claim_pending_emails(
        &self,
        limit: usize,
        lease_seconds: u32,
    ) -> AppResult<Vec<QueuedEmail>> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start email claim transaction: {error}"))
        })?;

        let mut rows = sqlx::query_as::<_, ClaimedEmailRow>(
            r#"
            WITH candidate_emails AS (
                SELECT id
                FROM email_queue
                WHERE status = 'pending'
                  AND (lease_expires_at IS NULL OR lease_expires_at < now())
                ORDER BY created_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE email_queue emails
            SET lease_expires_at = now() + make_interval(secs => $2::INT),
                claim_token = gen_random_uuid()
            FROM candidate_emails
            WHERE emails.id = candidate_emails.id
            RETURNING
                emails.id,
                emails.recipient,
                emails.subject,
                emails.text_body,
                emails.attempts,
                emails.claim_token,
                emails.created_at
            "#,
        )
        .bind(i64::try_from(limit).map_err(|error| {
            AppError::Validation(format!("invalid email claim limit: {error}"))
        })?)
        .bind(i32::try_from(lease_seconds).map_err(|error| {
            AppError::Validation(format!("invalid email lease_seconds: {error}"))
        })?)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to claim queued emails: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit email claim transaction: {error}"))
        })?;

        rows.sort_by_key(|row| row.created_at);
        rows.into_iter()
            .map(|row| {
                Ok(QueuedEmail {
                    email_id: QueuedEmailId::from_uuid(row.id),
                    recipient: row.recipient,
                    subject: row.subject,
                    text_body: row.text_body,
                    attempts: u32::try_from(row.attempts).map_err(|error| {
                        AppError::Internal(format!(
                            "invalid attempts value for email '{}': {error}",
                            row.id
                        ))
                    })?,
                    claim_token: EmailClaimToken::from_uuid(row.claim_token),
                })
            })
            .collect()
    }

    async fn mark_sent(
        &self,
        email_id: QueuedEmailId,
        claim_token: EmailClaimToken,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE email_queue
            SET status = 'sent',
                sent_at = now(),
                lease_expires_at = NULL,
                claim_token = NULL,
                last_error = NULL
            WHERE id = $1
              AND claim_token = $2
              AND status = 'pending'
            "#,
        )
        .bind(email_id.as_uuid())
        .bind(claim_token.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to mark email '{email_id}' as sent: {error}"))
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_failure(
        &self,
        email_id: QueuedEmailId,
        claim_token: EmailClaimToken,
        error: &str,
        max_attempts: u32,
    ) -> AppResult<Option<QueuedEmailStatus>> {
        let status = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE email_queue
            SET attempts = attempts + 1,
                last_error = $3,
                lease_expires_at = NULL,
                claim_token = NULL,
                status = CASE
                    WHEN attempts + 1 >= $4 THEN 'failed'
                    ELSE 'pending'
                END
            WHERE id = $1
              AND claim_token = $2
              AND status = 'pending'
            RETURNING status
            "#,
        )
        .bind(email_id.as_uuid())
        .bind(claim_token.as_uuid())
        .bind(error)
        .bind(i32::try_from(max_attempts).map_err(|error| {
            AppError::Validation(format!("invalid email max_attempts: {error}"))
        })?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to record delivery failure for email '{email_id}': {error}"
            ))
        })?;

        status
            .map(|status| QueuedEmailStatus::from_str(status.as_str()))
            .transpose()
    }
}
