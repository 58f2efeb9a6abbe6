//! Job repository — the durable queue store.
//!
//! Delivery contract: at-least-once. A claim marks the row `running`,
//! counts the attempt, and stamps a visibility lease; a claimed job whose
//! lease expires without acknowledgement is released back to `pending`
//! and redelivered. FIFO is best-effort (`created_at` order among due
//! rows), not a guarantee.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use paperjet_core::error::{AppError, ErrorKind};
use paperjet_core::result::AppResult;
use paperjet_entity::job::model::{CreateJob, Job};
use paperjet_entity::job::status::JobStatus;

/// Repository for background job CRUD and queue operations.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a job by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find job", e))
    }

    /// Insert a new pending job.
    ///
    /// A failure here means the queue store itself is unreachable, which
    /// callers surface synchronously — there is no local buffering.
    pub async fn create(&self, data: &CreateJob) -> AppResult<Job> {
        sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (job_type, queue, payload, max_attempts, scheduled_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(&data.job_type)
        .bind(&data.queue)
        .bind(&data.payload)
        .bind(data.max_attempts)
        .bind(data.scheduled_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to enqueue job", e)
        })
    }

    /// Claim the next due pending job from a queue (SKIP LOCKED), marking
    /// it running under a visibility lease of `lease_seconds`.
    pub async fn claim_next(
        &self,
        queue: &str,
        worker_id: &str,
        lease_seconds: u64,
    ) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'running', started_at = NOW(), worker_id = $2, \
             attempts = attempts + 1, \
             lease_expires_at = NOW() + make_interval(secs => $3), updated_at = NOW() \
             WHERE id = ( \
                SELECT id FROM jobs \
                WHERE queue = $1 AND status = 'pending' \
                AND (scheduled_at IS NULL OR scheduled_at <= NOW()) \
                ORDER BY created_at ASC \
                FOR UPDATE SKIP LOCKED \
                LIMIT 1 \
             ) RETURNING *",
        )
        .bind(queue)
        .bind(worker_id)
        .bind(lease_seconds as f64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim job", e))
    }

    /// Acknowledge a job as completed, storing its result payload.
    pub async fn mark_completed(
        &self,
        job_id: Uuid,
        result: Option<&serde_json::Value>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'completed', result = $2, lease_expires_at = NULL, \
             completed_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(job_id)
        .bind(result)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete job", e))?;
        Ok(())
    }

    /// Dead-letter a job: terminal failure, no further deliveries.
    ///
    /// Only a running job can be dead-lettered; a late acknowledgement
    /// from a worker that already finished wins over the sweep.
    pub async fn mark_dead(&self, job_id: Uuid, error_message: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'dead', error_message = $2, lease_expires_at = NULL, \
             completed_at = NOW(), updated_at = NOW() WHERE id = $1 AND status = 'running'",
        )
        .bind(job_id)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to dead-letter job", e))?;
        Ok(())
    }

    /// Return a transiently failed job to pending, scheduled for a
    /// backoff retry at `retry_at`. The attempt stays counted.
    pub async fn retry_at(
        &self,
        job_id: Uuid,
        error_message: &str,
        retry_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'pending', error_message = $2, scheduled_at = $3, \
             lease_expires_at = NULL, worker_id = NULL, updated_at = NOW() \
             WHERE id = $1 AND status = 'running'",
        )
        .bind(job_id)
        .bind(error_message)
        .bind(retry_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to schedule retry", e))?;
        Ok(())
    }

    /// Defer a not-yet-due job to `until` without consuming a delivery
    /// attempt (the claim already counted one, so it is handed back).
    pub async fn defer(&self, job_id: Uuid, until: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'pending', scheduled_at = $2, \
             attempts = GREATEST(attempts - 1, 0), \
             lease_expires_at = NULL, worker_id = NULL, updated_at = NOW() \
             WHERE id = $1 AND status = 'running'",
        )
        .bind(job_id)
        .bind(until)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to defer job", e))?;
        Ok(())
    }

    /// Fetch running jobs whose visibility lease has expired.
    ///
    /// The queue facade decides per job whether the retry budget allows
    /// a redelivery or the job must be dead-lettered.
    pub async fn find_expired_leases(&self) -> AppResult<Vec<Job>> {
        sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE status = 'running' \
             AND lease_expires_at IS NOT NULL AND lease_expires_at < NOW() \
             ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find expired leases", e)
        })
    }

    /// Return a single expired-lease job to pending for redelivery.
    ///
    /// Guarded on `running` so a worker that acknowledged between the
    /// sweep's read and this write is left alone. Returns whether the
    /// job was actually released.
    pub async fn release_lease(&self, job_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE jobs SET status = 'pending', lease_expires_at = NULL, worker_id = NULL, \
             updated_at = NOW() WHERE id = $1 AND status = 'running'",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to release job lease", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    /// Cancel a job that has not started yet.
    ///
    /// Only pending jobs can be cancelled; a running or terminal job
    /// fails with a conflict, a missing one with not-found.
    pub async fn mark_cancelled(&self, job_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE jobs SET status = 'cancelled', completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to cancel job", e))?;

        if result.rows_affected() == 0 {
            return match self.find_by_id(job_id).await? {
                None => Err(AppError::not_found(format!("No job with id {job_id}"))),
                Some(job) => Err(AppError::conflict(format!(
                    "Job {job_id} is {} and cannot be cancelled",
                    job.status
                ))),
            };
        }
        Ok(())
    }

    /// Delete terminal jobs older than `before`. Returns the number deleted.
    pub async fn cleanup_old(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM jobs WHERE status IN ('completed', 'dead', 'cancelled') \
             AND updated_at < $1",
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to cleanup jobs", e))?;
        Ok(result.rows_affected())
    }

    /// Count jobs by status (observability).
    pub async fn count_by_status(&self, status: JobStatus) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count jobs", e))
    }
}
