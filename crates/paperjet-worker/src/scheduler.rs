//! Cron scheduler for periodic queue maintenance.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use paperjet_core::error::AppError;
use paperjet_core::result::AppResult;
use paperjet_entity::job::payload::JobPayload;

use crate::queue::JobQueue;

/// Cron-based scheduler that enqueues periodic maintenance jobs.
pub struct CronScheduler {
    /// The underlying job scheduler.
    scheduler: JobScheduler,
    /// Job queue for enqueuing scheduled work.
    queue: Arc<JobQueue>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler.
    pub async fn new(queue: Arc<JobQueue>) -> AppResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, queue })
    }

    /// Register all default scheduled tasks.
    pub async fn register_default_tasks(&self) -> AppResult<()> {
        self.register_job_sweep().await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> AppResult<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&mut self) -> AppResult<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Queue sweep — every 5 minutes. Releases expired leases and prunes
    /// old terminal jobs.
    async fn register_job_sweep(&self) -> AppResult<()> {
        let queue = Arc::clone(&self.queue);
        let job = CronJob::new_async("0 */5 * * * *", move |_uuid, _lock| {
            let queue = Arc::clone(&queue);
            Box::pin(async move {
                tracing::debug!("Scheduling job sweep");
                if let Err(e) = queue.enqueue(&JobPayload::JobSweep).await {
                    tracing::error!("Failed to enqueue job sweep: {}", e);
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create job_sweep schedule: {}", e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add job_sweep schedule: {}", e)))?;

        tracing::info!("Registered: job_sweep (every 5min)");
        Ok(())
    }
}
