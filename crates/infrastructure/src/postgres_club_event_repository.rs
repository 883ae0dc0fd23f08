use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use divehub_application::ClubEventRepository;
use divehub_core::{AppError, AppResult};
use divehub_domain::{ClubEvent, ClubEventId, ClubEventInput, ClubEventStatus};

#[cfg(test)]
mod tests;

/// PostgreSQL-backed club event repository.
#[derive(Clone)]
pub struct PostgresClubEventRepository {
    pool: PgPool,
}

impl PostgresClubEventRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ClubEventRow {
    id: uuid::Uuid,
    title: String,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    status: String,
}

fn club_event_from_row(row: ClubEventRow) -> AppResult<ClubEvent> {
    ClubEvent::restore(
        ClubEventId::from_uuid(row.id),
        ClubEventInput {
            title: row.title,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
        },
        ClubEventStatus::from_str(row.status.as_str())?,
    )
}

#[async_trait]
impl ClubEventRepository for PostgresClubEventRepository {
    async fn save_event(&self, event: ClubEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO club_events (
                id,
                title,
                starts_at,
                ends_at,
                status
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.event_id().as_uuid())
        .bind(event.title().as_str())
        .bind(event.starts_at())
        .bind(event.ends_at())
        .bind(event.status().as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to save club event '{}': {error}",
                event.event_id()
            ))
        })?;

        Ok(())
    }

    async fn find_event(&self, event_id: ClubEventId) -> AppResult<Option<ClubEvent>> {
        let row = sqlx::query_as::<_, ClubEventRow>(
            r#"
            SELECT id, title, starts_at, ends_at, status
            FROM club_events
            WHERE id = $1
            "#,
        )
        .bind(event_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find club event '{event_id}': {error}"))
        })?;

        row.map(club_event_from_row).transpose()
    }

    async fn list_events_due_for_closing(&self, now: DateTime<Utc>) -> AppResult<Vec<ClubEvent>> {
        let rows = sqlx::query_as::<_, ClubEventRow>(
            r#"
            SELECT id, title, starts_at, ends_at, status
            FROM club_events
            WHERE status = 'open'
              AND ends_at <= $1
            ORDER BY ends_at ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list club events due for closing: {error}"))
        })?;

        rows.into_iter().map(club_event_from_row).collect()
    }

    async fn update_status(
        &self,
        event_id: ClubEventId,
        expected: ClubEventStatus,
        next: ClubEventStatus,
    ) -> AppResult<bool> {
        if !expected.can_transition_to(next) {
            return Err(AppError::Validation(format!(
                "club event status cannot move from '{}' to '{}'",
                expected.as_str(),
                next.as_str()
            )));
        }

        let result = sqlx::query(
            r#"
            UPDATE club_events
            SET status = $3,
                updated_at = now()
            WHERE id = $1
              AND status = $2
            "#,
        )
        .bind(event_id.as_uuid())
        .bind(expected.as_str())
        .bind(next.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to update status of club event '{event_id}': {error}"
            ))
        })?;

        Ok(result.rows_affected() > 0)
    }
}
