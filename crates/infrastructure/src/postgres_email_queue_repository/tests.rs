use divehub_application::{EmailQueueRepository, NewQueuedEmail, QueuedEmail};
use divehub_domain::{EmailAddress, QueuedEmailId, QueuedEmailStatus};
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::PostgresEmailQueueRepository;
use crate::test_support::test_pool;

// Claims lease every pending row, so tests sharing the table run one at a time.
static EMAIL_QUEUE_TABLE: Mutex<()> = Mutex::const_new(());

async fn enqueue(repository: &PostgresEmailQueueRepository, label: &str) -> QueuedEmailId {
    let address = format!("{label}-{}@club.example", Uuid::new_v4());
    let Ok(recipient) = EmailAddress::new(address) else {
        panic!("recipient should be valid");
    };

    let queued = repository
        .enqueue_email(NewQueuedEmail {
            recipient,
            subject: "Dive briefing".to_owned(),
            text_body: "Meet at the dock at 7.".to_owned(),
        })
        .await;
    let Ok(email_id) = queued else {
        panic!("email should be queued");
    };
    email_id
}

async fn claim(
    repository: &PostgresEmailQueueRepository,
    email_id: QueuedEmailId,
) -> Option<QueuedEmail> {
    repository
        .claim_pending_emails(1_000, 300)
        .await
        .unwrap_or_default()
        .into_iter()
        .find(|email| email.email_id == email_id)
}

async fn expire_lease(pool: &PgPool, email_id: QueuedEmailId) {
    let expired = sqlx::query(
        r#"
        UPDATE email_queue
        SET lease_expires_at = now() - INTERVAL '1 second'
        WHERE id = $1
        "#,
    )
    .bind(email_id.as_uuid())
    .execute(pool)
    .await;
    assert!(expired.is_ok());
}

#[tokio::test]
async fn failed_attempts_retry_until_max_attempts_then_fail() {
    let _table = EMAIL_QUEUE_TABLE.lock().await;
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresEmailQueueRepository::new(pool);
    let email_id = enqueue(&repository, "bounce").await;

    for (attempt, expected) in [
        (0, QueuedEmailStatus::Pending),
        (1, QueuedEmailStatus::Pending),
        (2, QueuedEmailStatus::Failed),
    ] {
        let Some(claimed) = claim(&repository, email_id).await else {
            panic!("email should be claimable on attempt {attempt}");
        };
        assert_eq!(claimed.attempts, attempt);

        let status = repository
            .record_failure(email_id, claimed.claim_token, "mailbox unavailable", 3)
            .await;
        assert_eq!(status.ok(), Some(Some(expected)));
    }

    assert!(claim(&repository, email_id).await.is_none());
}

#[tokio::test]
async fn leased_email_is_not_claimed_twice() {
    let _table = EMAIL_QUEUE_TABLE.lock().await;
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresEmailQueueRepository::new(pool);
    let email_id = enqueue(&repository, "lease").await;

    let Some(claimed) = claim(&repository, email_id).await else {
        panic!("email should be claimable");
    };
    assert!(claim(&repository, email_id).await.is_none());

    assert_eq!(
        repository.mark_sent(email_id, claimed.claim_token).await.ok(),
        Some(true)
    );
    assert!(claim(&repository, email_id).await.is_none());
}

#[tokio::test]
async fn stale_claim_cannot_settle_a_reclaimed_email() {
    let _table = EMAIL_QUEUE_TABLE.lock().await;
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresEmailQueueRepository::new(pool.clone());
    let email_id = enqueue(&repository, "stale").await;

    let Some(first) = claim(&repository, email_id).await else {
        panic!("email should be claimable");
    };
    expire_lease(&pool, email_id).await;
    let Some(second) = claim(&repository, email_id).await else {
        panic!("expired lease should be claimable again");
    };
    assert_ne!(first.claim_token, second.claim_token);

    assert_eq!(
        repository.mark_sent(email_id, first.claim_token).await.ok(),
        Some(false)
    );
    assert_eq!(
        repository
            .record_failure(email_id, first.claim_token, "timeout", 5)
            .await
            .ok(),
        Some(None)
    );
    assert_eq!(
        repository.mark_sent(email_id, second.claim_token).await.ok(),
        Some(true)
    );
}
