//! Table-backed artifact queue.
//!
//! Jobs move `pending -> leased -> done`. A lease that runs out without
//! `complete` or `fail` makes the job claimable again, so a crashed worker
//! never loses work. `fail` returns the job to `pending` until it has been
//! attempted `max_attempts` times, after which it is parked as `failed`.
//! A lease that runs out on the last allowed attempt is parked the same way
//! on the next claim.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{variant_path, ArtifactJob, ArtifactQueue, DEFAULT_VARIANT_SIZES};
use crate::db::DbPool;
use crate::{Result, VaultError};

fn queue_error(e: sqlx::Error) -> VaultError {
    VaultError::Queue(e.to_string())
}

/// A job handed to a worker.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ClaimedJob {
    /// Queue row ID, used to acknowledge the job.
    pub id: i64,
    pub file_id: i64,
    pub user_id: i64,
    /// Number of deliveries, including this one.
    pub attempts: i64,
}

impl ClaimedJob {
    pub fn job(&self) -> ArtifactJob {
        ArtifactJob::new(self.file_id, self.user_id)
    }
}

/// Durable queue stored in the `artifact_jobs` table.
#[derive(Clone)]
pub struct SqlArtifactQueue {
    pool: DbPool,
    lease: Duration,
    max_attempts: i64,
    variant_sizes: Vec<u32>,
}

impl SqlArtifactQueue {
    pub fn new(pool: DbPool, lease: Duration, max_attempts: i64) -> Self {
        Self {
            pool,
            lease,
            max_attempts: max_attempts.max(1),
            variant_sizes: DEFAULT_VARIANT_SIZES.to_vec(),
        }
    }

    /// Set the sizes workers render.
    pub fn with_variant_sizes(mut self, sizes: Vec<u32>) -> Self {
        self.variant_sizes = sizes;
        self
    }

    pub fn variant_sizes(&self) -> &[u32] {
        &self.variant_sizes
    }

    /// Paths a worker writes for the blob at `local_path`, one per size.
    pub fn variant_paths(&self, local_path: &str) -> Vec<String> {
        self.variant_sizes
            .iter()
            .map(|size| variant_path(local_path, *size))
            .collect()
    }

    fn lease_modifier(&self) -> String {
        format!("+{} seconds", self.lease.as_secs())
    }

    /// Park jobs whose lease ran out on their last allowed attempt.
    async fn park_exhausted(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE artifact_jobs
             SET status = 'failed',
                 last_error = COALESCE(last_error, 'lease expired'),
                 leased_until = NULL,
                 updated_at = datetime('now')
             WHERE status = 'leased'
               AND leased_until <= datetime('now')
               AND attempts >= $1",
        )
        .bind(self.max_attempts)
        .execute(&self.pool)
        .await
        .map_err(queue_error)?;

        let parked = result.rows_affected();
        if parked > 0 {
            warn!(parked, "Artifact jobs exhausted their attempts");
        }
        Ok(parked)
    }

    /// Lease the oldest claimable job, if any.
    ///
    /// The select and the status change happen in one statement, so two
    /// workers never receive the same job within one lease.
    pub async fn claim_next(&self) -> Result<Option<ClaimedJob>> {
        self.park_exhausted().await?;

        let claimed = sqlx::query_as::<_, ClaimedJob>(
            "UPDATE artifact_jobs
             SET status = 'leased',
                 attempts = attempts + 1,
                 leased_until = datetime('now', $1),
                 updated_at = datetime('now')
             WHERE id = (
                 SELECT id FROM artifact_jobs
                 WHERE (status = 'pending'
                        OR (status = 'leased' AND leased_until <= datetime('now')))
                   AND attempts < $2
                 ORDER BY id
                 LIMIT 1
             )
             RETURNING id, file_id, user_id, attempts",
        )
        .bind(self.lease_modifier())
        .bind(self.max_attempts)
        .fetch_optional(&self.pool)
        .await
        .map_err(queue_error)?;

        if let Some(job) = &claimed {
            debug!(
                job_id = job.id,
                file_id = job.file_id,
                attempts = job.attempts,
                "Artifact job claimed"
            );
        }
        Ok(claimed)
    }

    /// Acknowledge a leased job.
    pub async fn complete(&self, job_id: i64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE artifact_jobs
             SET status = 'done', leased_until = NULL, updated_at = datetime('now')
             WHERE id = $1 AND status = 'leased'",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(queue_error)?;

        if result.rows_affected() == 0 {
            return Err(VaultError::NotFound("artifact job".to_string()));
        }
        debug!(job_id, "Artifact job completed");
        Ok(())
    }

    /// Record a failed attempt. The job is retried until `max_attempts`.
    pub async fn fail(&self, job_id: i64, reason: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE artifact_jobs
             SET status = CASE WHEN attempts >= $2 THEN 'failed' ELSE 'pending' END,
                 last_error = $3,
                 leased_until = NULL,
                 updated_at = datetime('now')
             WHERE id = $1 AND status = 'leased'",
        )
        .bind(job_id)
        .bind(self.max_attempts)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(queue_error)?;

        if result.rows_affected() == 0 {
            return Err(VaultError::NotFound("artifact job".to_string()));
        }
        warn!(job_id, reason, "Artifact job failed");
        Ok(())
    }

    /// Number of jobs waiting for a worker.
    pub async fn pending_count(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM artifact_jobs WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await
                .map_err(queue_error)?;
        Ok(count)
    }

    /// Status of a job row, for inspection.
    pub async fn status(&self, job_id: i64) -> Result<Option<String>> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM artifact_jobs WHERE id = $1")
                .bind(job_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(queue_error)?;
        Ok(status)
    }
}

#[async_trait]
impl ArtifactQueue for SqlArtifactQueue {
    async fn enqueue(&self, job: ArtifactJob) -> Result<()> {
        sqlx::query("INSERT INTO artifact_jobs (file_id, user_id) VALUES ($1, $2)")
            .bind(job.file_id)
            .bind(job.user_id)
            .execute(&self.pool)
            .await
            .map_err(queue_error)?;

        info!(
            file_id = job.file_id,
            user_id = job.user_id,
            "Artifact job enqueued"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup(lease: Duration, max_attempts: i64) -> (Database, SqlArtifactQueue) {
        let db = Database::open_in_memory().await.unwrap();
        let queue = SqlArtifactQueue::new(db.pool().clone(), lease, max_attempts);
        (db, queue)
    }

    #[tokio::test]
    async fn test_enqueue_and_claim_in_order() {
        let (_db, queue) = setup(Duration::from_secs(300), 5).await;

        queue.enqueue(ArtifactJob::new(10, 1)).await.unwrap();
        queue.enqueue(ArtifactJob::new(11, 1)).await.unwrap();
        assert_eq!(queue.pending_count().await.unwrap(), 2);

        let first = queue.claim_next().await.unwrap().unwrap();
        assert_eq!(first.job(), ArtifactJob::new(10, 1));
        assert_eq!(first.attempts, 1);

        let second = queue.claim_next().await.unwrap().unwrap();
        assert_eq!(second.file_id, 11);

        assert!(queue.claim_next().await.unwrap().is_none());
        assert_eq!(queue.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_complete() {
        let (_db, queue) = setup(Duration::from_secs(300), 5).await;
        queue.enqueue(ArtifactJob::new(1, 1)).await.unwrap();

        let job = queue.claim_next().await.unwrap().unwrap();
        queue.complete(job.id).await.unwrap();

        assert_eq!(queue.status(job.id).await.unwrap().as_deref(), Some("done"));
        assert!(queue.claim_next().await.unwrap().is_none());

        // Already acknowledged.
        let again = queue.complete(job.id).await;
        assert!(matches!(again, Err(VaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_fail_retries_then_parks() {
        let (_db, queue) = setup(Duration::from_secs(300), 2).await;
        queue.enqueue(ArtifactJob::new(1, 1)).await.unwrap();

        let job = queue.claim_next().await.unwrap().unwrap();
        queue.fail(job.id, "decoder crashed").await.unwrap();
        assert_eq!(queue.status(job.id).await.unwrap().as_deref(), Some("pending"));

        let retry = queue.claim_next().await.unwrap().unwrap();
        assert_eq!(retry.id, job.id);
        assert_eq!(retry.attempts, 2);

        queue.fail(retry.id, "decoder crashed").await.unwrap();
        assert_eq!(queue.status(job.id).await.unwrap().as_deref(), Some("failed"));
        assert!(queue.claim_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_lease_is_redelivered() {
        let (_db, queue) = setup(Duration::ZERO, 5).await;
        queue.enqueue(ArtifactJob::new(7, 3)).await.unwrap();

        let first = queue.claim_next().await.unwrap().unwrap();
        let second = queue.claim_next().await.unwrap().unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.attempts, 2);
    }

    #[tokio::test]
    async fn test_expired_final_attempt_is_parked() {
        let (_db, queue) = setup(Duration::ZERO, 1).await;
        queue.enqueue(ArtifactJob::new(7, 3)).await.unwrap();

        let job = queue.claim_next().await.unwrap().unwrap();
        assert_eq!(job.attempts, 1);

        // Worker never acknowledges; its lease is already over.
        assert!(queue.claim_next().await.unwrap().is_none());
        assert_eq!(queue.status(job.id).await.unwrap().as_deref(), Some("failed"));
        assert_eq!(queue.pending_count().await.unwrap(), 0);

        let late = queue.complete(job.id).await;
        assert!(matches!(late, Err(VaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_active_lease_is_not_redelivered() {
        let (_db, queue) = setup(Duration::from_secs(300), 5).await;
        queue.enqueue(ArtifactJob::new(7, 3)).await.unwrap();

        assert!(queue.claim_next().await.unwrap().is_some());
        assert!(queue.claim_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_variant_paths() {
        let (_db, queue) = setup(Duration::from_secs(300), 5).await;
        assert_eq!(
            queue.variant_paths("/blobs/abc"),
            vec!["/blobs/abc_500", "/blobs/abc_250", "/blobs/abc_100"]
        );

        let queue = queue.with_variant_sizes(vec![64]);
        assert_eq!(queue.variant_sizes(), &[64]);
        assert_eq!(queue.variant_paths("/blobs/abc"), vec!["/blobs/abc_64"]);
    }

    #[tokio::test]
    async fn test_fail_unknown_job() {
        let (_db, queue) = setup(Duration::from_secs(300), 5).await;
        let result = queue.fail(99, "nope").await;
        assert!(matches!(result, Err(VaultError::NotFound(_))));
    }
}
