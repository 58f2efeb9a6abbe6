//! Worker runner — per-queue loop that claims and executes jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use paperjet_entity::job::model::Job;

use crate::handler::{JobHandler, JobOutcome};
use crate::queue::JobQueue;

/// Worker runner bound to exactly one queue and one handler.
///
/// Processes one job at a time; separate roles get separate runners and
/// run concurrently with respect to each other. When the queue is empty
/// the runner sleeps a configured poll interval; after processing a job
/// it claims again immediately.
#[derive(Debug)]
pub struct WorkerRunner {
    /// Job queue facade.
    queue: Arc<JobQueue>,
    /// Handler for the bound queue.
    handler: Arc<dyn JobHandler>,
    /// Sleep between polls when the queue is empty.
    poll_interval: Duration,
}

impl WorkerRunner {
    /// Create a new worker runner.
    pub fn new(queue: Arc<JobQueue>, handler: Arc<dyn JobHandler>, poll_interval: Duration) -> Self {
        Self {
            queue,
            handler,
            poll_interval,
        }
    }

    /// Run until the cancel signal flips to `true`.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        let queue_name = self.handler.queue().to_string();
        tracing::info!(
            "Worker for queue '{}' started, poll_interval={}s",
            queue_name,
            self.poll_interval.as_secs()
        );

        loop {
            if *cancel.borrow() {
                break;
            }

            match self.queue.claim(&queue_name).await {
                Ok(Some(job)) => {
                    // Claim again right away; back-to-back jobs should not
                    // pay the poll interval.
                    self.process(job).await;
                }
                Ok(None) => {
                    tracing::trace!("Queue '{}' empty", queue_name);
                    self.idle(&mut cancel).await;
                }
                Err(e) => {
                    tracing::error!("Failed to claim from queue '{}': {}", queue_name, e);
                    self.idle(&mut cancel).await;
                }
            }
        }

        tracing::info!("Worker for queue '{}' shut down", queue_name);
    }

    /// Sleep the poll interval, waking early on shutdown.
    async fn idle(&self, cancel: &mut watch::Receiver<bool>) {
        tokio::select! {
            _ = cancel.changed() => {}
            _ = time::sleep(self.poll_interval) => {}
        }
    }

    /// Execute a claimed job and report its outcome to the queue.
    async fn process(&self, job: Job) {
        tracing::info!(
            "Processing job: id={}, type='{}', attempt={}/{}",
            job.id,
            job.job_type,
            job.attempts,
            job.max_attempts
        );

        match self.handler.execute(&job).await {
            Ok(JobOutcome::Completed(result)) => {
                if let Err(e) = self.queue.complete(job.id, result).await {
                    tracing::error!("Failed to mark job {} as completed: {}", job.id, e);
                } else {
                    tracing::info!("Job {} completed successfully", job.id);
                }
            }
            Ok(JobOutcome::Deferred(until)) => {
                if let Err(e) = self.queue.defer(job.id, until).await {
                    tracing::error!("Failed to defer job {}: {}", job.id, e);
                }
            }
            Err(err) if err.is_transient() => {
                if let Err(e) = self.queue.fail_transient(&job, &err.to_string()).await {
                    tracing::error!("Failed to schedule retry for job {}: {}", job.id, e);
                }
            }
            Err(err) => {
                if let Err(e) = self.queue.fail_permanent(job.id, &err.to_string()).await {
                    tracing::error!("Failed to dead-letter job {}: {}", job.id, e);
                }
            }
        }
    }
}
