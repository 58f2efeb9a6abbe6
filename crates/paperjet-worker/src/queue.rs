//! Queue facade over the durable job store.
//!
//! Producers enqueue typed payloads; runners claim, acknowledge, retry,
//! and dead-letter through this facade. The queue name and job type are
//! always derived from the payload variant, never passed free-form.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use paperjet_core::config::worker::WorkerConfig;
use paperjet_core::result::AppResult;
use paperjet_database::repositories::job::JobRepository;
use paperjet_entity::job::model::{CreateJob, Job};
use paperjet_entity::job::payload::JobPayload;
use paperjet_entity::job::status::JobStatus;

/// Row-level operations the queue facade needs from the durable store.
///
/// Implemented by the Postgres-backed `JobRepository`; tests substitute
/// an in-memory store so the facade's retry and lease policies can be
/// exercised without a database.
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug {
    /// Insert a new pending job.
    async fn create(&self, data: &CreateJob) -> AppResult<Job>;

    /// Claim the next due pending job from a queue under a lease.
    async fn claim_next(
        &self,
        queue: &str,
        worker_id: &str,
        lease_seconds: u64,
    ) -> AppResult<Option<Job>>;

    /// Acknowledge a job as completed.
    async fn mark_completed(
        &self,
        job_id: Uuid,
        result: Option<&serde_json::Value>,
    ) -> AppResult<()>;

    /// Dead-letter a running job.
    async fn mark_dead(&self, job_id: Uuid, error_message: &str) -> AppResult<()>;

    /// Return a transiently failed job to pending, due at `retry_at`.
    async fn retry_at(
        &self,
        job_id: Uuid,
        error_message: &str,
        retry_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Hand a not-yet-due job back, scheduled for `until`, uncounting
    /// the delivery attempt.
    async fn defer(&self, job_id: Uuid, until: DateTime<Utc>) -> AppResult<()>;

    /// Cancel a pending job.
    async fn mark_cancelled(&self, job_id: Uuid) -> AppResult<()>;

    /// Fetch running jobs whose visibility lease has expired.
    async fn find_expired_leases(&self) -> AppResult<Vec<Job>>;

    /// Return one expired-lease job to pending; false if it was no
    /// longer running.
    async fn release_lease(&self, job_id: Uuid) -> AppResult<bool>;

    /// Delete terminal jobs older than `before`.
    async fn cleanup_old(&self, before: DateTime<Utc>) -> AppResult<u64>;

    /// Count jobs in a given status.
    async fn count_by_status(&self, status: JobStatus) -> AppResult<i64>;
}

#[async_trait]
impl JobStore for JobRepository {
    async fn create(&self, data: &CreateJob) -> AppResult<Job> {
        JobRepository::create(self, data).await
    }

    async fn claim_next(
        &self,
        queue: &str,
        worker_id: &str,
        lease_seconds: u64,
    ) -> AppResult<Option<Job>> {
        JobRepository::claim_next(self, queue, worker_id, lease_seconds).await
    }

    async fn mark_completed(
        &self,
        job_id: Uuid,
        result: Option<&serde_json::Value>,
    ) -> AppResult<()> {
        JobRepository::mark_completed(self, job_id, result).await
    }

    async fn mark_dead(&self, job_id: Uuid, error_message: &str) -> AppResult<()> {
        JobRepository::mark_dead(self, job_id, error_message).await
    }

    async fn retry_at(
        &self,
        job_id: Uuid,
        error_message: &str,
        retry_at: DateTime<Utc>,
    ) -> AppResult<()> {
        JobRepository::retry_at(self, job_id, error_message, retry_at).await
    }

    async fn defer(&self, job_id: Uuid, until: DateTime<Utc>) -> AppResult<()> {
        JobRepository::defer(self, job_id, until).await
    }

    async fn mark_cancelled(&self, job_id: Uuid) -> AppResult<()> {
        JobRepository::mark_cancelled(self, job_id).await
    }

    async fn find_expired_leases(&self) -> AppResult<Vec<Job>> {
        JobRepository::find_expired_leases(self).await
    }

    async fn release_lease(&self, job_id: Uuid) -> AppResult<bool> {
        JobRepository::release_lease(self, job_id).await
    }

    async fn cleanup_old(&self, before: DateTime<Utc>) -> AppResult<u64> {
        JobRepository::cleanup_old(self, before).await
    }

    async fn count_by_status(&self, status: JobStatus) -> AppResult<i64> {
        JobRepository::count_by_status(self, status).await
    }
}

/// Job queue for enqueuing and claiming work.
#[derive(Debug, Clone)]
pub struct JobQueue {
    /// Durable queue store.
    repo: Arc<dyn JobStore>,
    /// Worker configuration (lease, retry schedule, retention).
    config: WorkerConfig,
    /// Worker identifier stamped on claims.
    worker_id: String,
}

impl JobQueue {
    /// Create a new job queue facade.
    pub fn new(repo: Arc<dyn JobStore>, config: WorkerConfig, worker_id: String) -> Self {
        Self {
            repo,
            config,
            worker_id,
        }
    }

    /// Enqueue a typed payload, immediately due.
    pub async fn enqueue(&self, payload: &JobPayload) -> AppResult<Job> {
        self.enqueue_at(payload, None).await
    }

    /// Enqueue a typed payload, due no earlier than `scheduled_at`.
    ///
    /// An error here means the queue store itself rejected the insert;
    /// producers surface it synchronously.
    pub async fn enqueue_at(
        &self,
        payload: &JobPayload,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> AppResult<Job> {
        let data = CreateJob {
            job_type: payload.job_type().to_string(),
            queue: payload.queue().to_string(),
            payload: serde_json::to_value(payload)?,
            max_attempts: self.config.max_attempts,
            scheduled_at,
        };

        let job = self.repo.create(&data).await?;

        tracing::debug!(
            "Enqueued job: id={}, type='{}', queue='{}', scheduled_at={:?}",
            job.id,
            job.job_type,
            job.queue,
            job.scheduled_at
        );

        Ok(job)
    }

    /// Claim the next due job from a queue under a visibility lease.
    pub async fn claim(&self, queue: &str) -> AppResult<Option<Job>> {
        let job = self
            .repo
            .claim_next(queue, &self.worker_id, self.config.lease_seconds)
            .await?;

        if let Some(job) = &job {
            tracing::debug!(
                "Claimed job: id={}, type='{}', attempt={}/{}",
                job.id,
                job.job_type,
                job.attempts,
                job.max_attempts
            );
        }

        Ok(job)
    }

    /// Acknowledge a job as completed.
    pub async fn complete(&self, job_id: Uuid, result: Option<serde_json::Value>) -> AppResult<()> {
        self.repo.mark_completed(job_id, result.as_ref()).await?;
        tracing::debug!("Job completed: id={}", job_id);
        Ok(())
    }

    /// Report a transient failure for a claimed job.
    ///
    /// While attempts remain the job goes back to pending, scheduled for
    /// an exponential-backoff retry; once they run out it is dead-lettered.
    pub async fn fail_transient(&self, job: &Job, error: &str) -> AppResult<()> {
        if job.attempts_remaining() {
            let delay = backoff_delay(self.config.retry_backoff_base_seconds, job.attempts);
            let retry_at = Utc::now() + delay;
            self.repo.retry_at(job.id, error, retry_at).await?;
            tracing::warn!(
                "Job retry scheduled: id={}, attempt={}/{}, retry_in={}s, error='{}'",
                job.id,
                job.attempts,
                job.max_attempts,
                delay.num_seconds(),
                error
            );
        } else {
            self.repo.mark_dead(job.id, error).await?;
            tracing::error!(
                "Job dead-lettered after {} attempts: id={}, error='{}'",
                job.attempts,
                job.id,
                error
            );
        }
        Ok(())
    }

    /// Dead-letter a job immediately; retrying would not help.
    pub async fn fail_permanent(&self, job_id: Uuid, error: &str) -> AppResult<()> {
        self.repo.mark_dead(job_id, error).await?;
        tracing::error!("Job failed permanently: id={}, error='{}'", job_id, error);
        Ok(())
    }

    /// Hand a claimed job back to the queue, due at `until`, without
    /// consuming a delivery attempt.
    pub async fn defer(&self, job_id: Uuid, until: DateTime<Utc>) -> AppResult<()> {
        self.repo.defer(job_id, until).await?;
        tracing::info!("Job deferred: id={}, until={}", job_id, until);
        Ok(())
    }

    /// Cancel a pending job.
    pub async fn cancel(&self, job_id: Uuid) -> AppResult<()> {
        self.repo.mark_cancelled(job_id).await?;
        tracing::debug!("Job cancelled: id={}", job_id);
        Ok(())
    }

    /// Sweep running jobs whose visibility lease expired.
    ///
    /// A lease-expiry redelivery is a delivery attempt like any other:
    /// jobs with budget left go back to pending, jobs that already spent
    /// `max_attempts` are dead-lettered. Without the bound, a handler
    /// that repeatedly hangs past its lease would cycle pending/running
    /// forever and never reach the dead-letter state.
    pub async fn release_expired_leases(&self) -> AppResult<LeaseSweep> {
        let mut sweep = LeaseSweep::default();

        for job in self.repo.find_expired_leases().await? {
            if job.attempts_remaining() {
                if self.repo.release_lease(job.id).await? {
                    sweep.released += 1;
                    tracing::warn!(
                        "Released expired lease: id={}, attempt={}/{}",
                        job.id,
                        job.attempts,
                        job.max_attempts
                    );
                }
            } else {
                self.repo
                    .mark_dead(job.id, "Visibility lease expired with no attempts remaining")
                    .await?;
                sweep.dead += 1;
                tracing::error!(
                    "Job dead-lettered on lease expiry: id={}, attempts={}/{}",
                    job.id,
                    job.attempts,
                    job.max_attempts
                );
            }
        }

        Ok(sweep)
    }

    /// Delete terminal jobs older than the configured retention window.
    /// Returns the number of rows deleted.
    pub async fn cleanup_old(&self) -> AppResult<u64> {
        let before = Utc::now() - Duration::days(self.config.retention_days);
        let deleted = self.repo.cleanup_old(before).await?;
        if deleted > 0 {
            tracing::info!("Deleted {} terminal jobs older than {}", deleted, before);
        }
        Ok(deleted)
    }

    /// Get queue statistics.
    pub async fn stats(&self) -> AppResult<QueueStats> {
        let pending = self.repo.count_by_status(JobStatus::Pending).await?;
        let running = self.repo.count_by_status(JobStatus::Running).await?;
        let dead = self.repo.count_by_status(JobStatus::Dead).await?;

        Ok(QueueStats {
            pending,
            running,
            dead,
            worker_id: self.worker_id.clone(),
        })
    }
}

/// Queue statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    /// Number of pending jobs.
    pub pending: i64,
    /// Number of running jobs.
    pub running: i64,
    /// Number of dead-lettered jobs.
    pub dead: i64,
    /// Current worker identifier.
    pub worker_id: String,
}

/// Outcome of an expired-lease sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeaseSweep {
    /// Jobs returned to pending for redelivery.
    pub released: u64,
    /// Jobs dead-lettered because their retry budget was spent.
    pub dead: u64,
}

/// Delay before retry number `attempt + 1`, doubling per attempt.
///
/// `attempt` is the count of deliveries so far (>= 1 when called after a
/// failed execution). The exponent is clamped so large attempt counts
/// cannot overflow the shift.
fn backoff_delay(base_seconds: u64, attempt: i32) -> Duration {
    let exponent = attempt.saturating_sub(1).clamp(0, 16) as u32;
    let seconds = base_seconds.saturating_mul(1u64 << exponent);
    Duration::seconds(seconds.min(i64::MAX as u64) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_per_attempt() {
        assert_eq!(backoff_delay(30, 1), Duration::seconds(30));
        assert_eq!(backoff_delay(30, 2), Duration::seconds(60));
        assert_eq!(backoff_delay(30, 3), Duration::seconds(120));
    }

    #[test]
    fn test_backoff_monotonic() {
        let mut previous = Duration::zero();
        for attempt in 1..=40 {
            let delay = backoff_delay(30, attempt);
            assert!(delay >= previous, "backoff shrank at attempt {attempt}");
            previous = delay;
        }
    }

    #[test]
    fn test_backoff_handles_degenerate_attempts() {
        assert_eq!(backoff_delay(30, 0), Duration::seconds(30));
        assert_eq!(backoff_delay(30, -5), Duration::seconds(30));
    }

    use paperjet_core::error::ErrorKind;
    use paperjet_entity::job::payload::queues;

    use crate::jobs::testing::{FakeJobStore, running_job};

    fn queue_over(store: Arc<FakeJobStore>) -> JobQueue {
        let config = WorkerConfig {
            enabled: true,
            poll_interval_seconds: 1,
            lease_seconds: 60,
            max_attempts: 3,
            retry_backoff_base_seconds: 30,
            retention_days: 30,
        };
        JobQueue::new(store, config, "worker-test".to_string())
    }

    #[tokio::test]
    async fn test_enqueue_then_claim_counts_attempt() {
        let store = Arc::new(FakeJobStore::default());
        let queue = queue_over(Arc::clone(&store));

        let job = queue.enqueue(&JobPayload::JobSweep).await.unwrap();
        assert_eq!(job.queue, queues::MAINTENANCE);
        assert_eq!(job.attempts, 0);

        let claimed = queue.claim(queues::MAINTENANCE).await.unwrap().unwrap();
        assert_eq!(claimed.id, job.id);
        assert_eq!(claimed.attempts, 1);
        assert_eq!(claimed.status, JobStatus::Running);
        assert!(claimed.lease_expires_at.is_some());
    }

    #[tokio::test]
    async fn test_expired_lease_with_budget_is_released() {
        let store = Arc::new(FakeJobStore::default());
        let job = running_job(queues::MAINTENANCE, 1, 3, Utc::now() - Duration::minutes(5));
        let job_id = job.id;
        store.seed(job);

        let queue = queue_over(Arc::clone(&store));
        let sweep = queue.release_expired_leases().await.unwrap();

        assert_eq!(sweep, LeaseSweep { released: 1, dead: 0 });
        let row = store.get(job_id);
        assert_eq!(row.status, JobStatus::Pending);
        assert!(row.lease_expires_at.is_none());
        assert!(row.worker_id.is_none());
    }

    #[tokio::test]
    async fn test_expired_lease_with_spent_budget_is_dead_lettered() {
        let store = Arc::new(FakeJobStore::default());
        let job = running_job(queues::MAINTENANCE, 3, 3, Utc::now() - Duration::minutes(5));
        let job_id = job.id;
        store.seed(job);

        let queue = queue_over(Arc::clone(&store));
        let sweep = queue.release_expired_leases().await.unwrap();

        assert_eq!(sweep, LeaseSweep { released: 0, dead: 1 });
        let row = store.get(job_id);
        assert_eq!(row.status, JobStatus::Dead);
        assert!(row.error_message.is_some());

        // Dead is terminal: a second sweep must not resurrect it.
        let again = queue.release_expired_leases().await.unwrap();
        assert_eq!(again, LeaseSweep::default());
        assert_eq!(store.get(job_id).status, JobStatus::Dead);
    }

    #[tokio::test]
    async fn test_live_lease_left_alone() {
        let store = Arc::new(FakeJobStore::default());
        let job = running_job(queues::MAINTENANCE, 1, 3, Utc::now() + Duration::minutes(5));
        let job_id = job.id;
        store.seed(job);

        let queue = queue_over(Arc::clone(&store));
        let sweep = queue.release_expired_leases().await.unwrap();

        assert_eq!(sweep, LeaseSweep::default());
        assert_eq!(store.get(job_id).status, JobStatus::Running);
    }

    #[tokio::test]
    async fn test_cancel_is_pending_only() {
        let store = Arc::new(FakeJobStore::default());
        let queue = queue_over(Arc::clone(&store));

        let job = queue.enqueue(&JobPayload::JobSweep).await.unwrap();
        queue.cancel(job.id).await.unwrap();
        assert_eq!(store.get(job.id).status, JobStatus::Cancelled);

        let job = queue.enqueue(&JobPayload::JobSweep).await.unwrap();
        let claimed = queue.claim(queues::MAINTENANCE).await.unwrap().unwrap();
        let err = queue.cancel(claimed.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(store.get(job.id).status, JobStatus::Running);

        let err = queue.cancel(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
