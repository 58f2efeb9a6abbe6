//! Queue sweep job handler.
//!
//! Periodic maintenance enqueued by the cron scheduler: sweeps
//! visibility leases that expired without acknowledgement (redelivering
//! jobs with retry budget left, dead-lettering the rest) and prunes
//! terminal jobs past the retention window.

use std::sync::Arc;

use async_trait::async_trait;

use paperjet_entity::job::model::Job;
use paperjet_entity::job::payload::queues;

use crate::handler::{JobError, JobHandler, JobOutcome};
use crate::queue::JobQueue;

/// Handles queue sweep jobs.
#[derive(Debug)]
pub struct JobSweepHandler {
    /// Queue facade whose store is swept.
    queue: Arc<JobQueue>,
}

impl JobSweepHandler {
    /// Create a new job sweep handler.
    pub fn new(queue: Arc<JobQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl JobHandler for JobSweepHandler {
    fn queue(&self) -> &str {
        queues::MAINTENANCE
    }

    async fn execute(&self, _job: &Job) -> Result<JobOutcome, JobError> {
        let sweep = self.queue.release_expired_leases().await?;
        let deleted = self.queue.cleanup_old().await?;

        tracing::info!(
            "Queue sweep complete: released={}, dead={}, deleted={}",
            sweep.released,
            sweep.dead,
            deleted
        );

        Ok(JobOutcome::Completed(Some(serde_json::json!({
            "released_leases": sweep.released,
            "dead_jobs": sweep.dead,
            "deleted_jobs": deleted,
        }))))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use paperjet_core::config::worker::WorkerConfig;
    use paperjet_entity::job::payload::queues;
    use paperjet_entity::job::status::JobStatus;

    use crate::handler::{JobHandler, JobOutcome};
    use crate::jobs::testing::{FakeJobStore, running_job};
    use crate::queue::JobQueue;

    use super::JobSweepHandler;

    #[tokio::test]
    async fn test_sweep_reports_released_and_dead() {
        let store = Arc::new(FakeJobStore::default());
        let expired = Utc::now() - Duration::minutes(10);
        let retryable = running_job(queues::DOCUMENT_UPLOAD, 1, 3, expired);
        let exhausted = running_job(queues::DOCUMENT_UPLOAD, 3, 3, expired);
        let (retryable_id, exhausted_id) = (retryable.id, exhausted.id);
        store.seed(retryable);
        store.seed(exhausted);

        let queue = Arc::new(JobQueue::new(
            Arc::clone(&store) as _,
            WorkerConfig {
                enabled: true,
                poll_interval_seconds: 1,
                lease_seconds: 60,
                max_attempts: 3,
                retry_backoff_base_seconds: 30,
                retention_days: 30,
            },
            "worker-test".to_string(),
        ));
        let sweep_job = running_job(queues::MAINTENANCE, 1, 3, Utc::now() + Duration::minutes(5));

        let handler = JobSweepHandler::new(queue);
        let outcome = handler.execute(&sweep_job).await.unwrap();

        let JobOutcome::Completed(Some(result)) = outcome else {
            panic!("sweep did not complete with a result");
        };
        assert_eq!(result["released_leases"], 1);
        assert_eq!(result["dead_jobs"], 1);
        assert_eq!(store.get(retryable_id).status, JobStatus::Pending);
        assert_eq!(store.get(exhausted_id).status, JobStatus::Dead);
    }
}
