//! Typed job producers.
//!
//! Producers are the only way jobs enter the queues; they validate the
//! payload at the boundary so workers receive already-checked data and
//! can treat malformed payloads as permanent failures.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use paperjet_core::result::AppResult;
use paperjet_entity::job::model::Job;
use paperjet_entity::job::payload::JobPayload;
use paperjet_storage::staging::resolve_staged_path;

use crate::queue::JobQueue;

/// Producer-side entry points for the known job types.
#[derive(Debug, Clone)]
pub struct JobProducer {
    /// Queue facade.
    queue: Arc<JobQueue>,
    /// Staging root used to validate upload payloads.
    staging_root: PathBuf,
}

impl JobProducer {
    /// Create a new job producer.
    pub fn new(queue: Arc<JobQueue>, staging_root: PathBuf) -> Self {
        Self {
            queue,
            staging_root,
        }
    }

    /// Enqueue a document upload for a staged file.
    ///
    /// The staged path is validated against the staging root here, before
    /// the job exists; a traversal attempt fails the request, not a worker.
    pub async fn document_upload(&self, document_id: Uuid, staged_path: &str) -> AppResult<Job> {
        resolve_staged_path(&self.staging_root, staged_path)?;

        self.queue
            .enqueue(&JobPayload::DocumentUpload {
                document_id,
                staged_path: staged_path.to_string(),
            })
            .await
    }

    /// Enqueue an expiration for a subscription whose paid period ran out.
    pub async fn subscription_expiration(&self, user_id: Uuid, email: &str) -> AppResult<Job> {
        self.queue
            .enqueue(&JobPayload::SubscriptionExpiration {
                user_id,
                email: email.to_string(),
            })
            .await
    }

    /// Enqueue a subscription cancellation effective at `end_date`.
    ///
    /// A future end date is written into `scheduled_at` so the job is not
    /// claimed before it is due; the handler still defers if it gets an
    /// early delivery.
    pub async fn subscription_cancellation(
        &self,
        user_id: Uuid,
        end_date: DateTime<Utc>,
    ) -> AppResult<Job> {
        let scheduled_at = (end_date > Utc::now()).then_some(end_date);

        self.queue
            .enqueue_at(
                &JobPayload::SubscriptionCancellation { user_id, end_date },
                scheduled_at,
            )
            .await
    }
}
