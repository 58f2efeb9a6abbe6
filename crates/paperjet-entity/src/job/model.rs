//! Job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::payload::JobPayload;
use super::status::JobStatus;

/// A background job row — the durable queue store's unit of work.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    /// Unique job identifier.
    pub id: Uuid,
    /// Job type tag (matches the payload's serde tag).
    pub job_type: String,
    /// Queue name.
    pub queue: String,
    /// Job-specific payload (JSON form of [`JobPayload`]).
    pub payload: serde_json::Value,
    /// Result data on completion (JSON, observability only).
    pub result: Option<serde_json::Value>,
    /// Error message on failure.
    pub error_message: Option<String>,
    /// Current job status.
    pub status: JobStatus,
    /// Number of delivery attempts so far.
    pub attempts: i32,
    /// Maximum allowed attempts before dead-lettering.
    pub max_attempts: i32,
    /// Earliest execution time (None = immediately due).
    pub scheduled_at: Option<DateTime<Utc>>,
    /// When the current/last attempt started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// Visibility lease expiry; a running job past this point is
    /// redeliverable.
    pub lease_expires_at: Option<DateTime<Utc>>,
    /// Worker ID that claimed the job.
    pub worker_id: Option<String>,
    /// When the job was enqueued.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Deserialize the typed payload back out of the JSON column.
    pub fn typed_payload(&self) -> Result<JobPayload, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }

    /// Whether another delivery attempt is allowed.
    pub fn attempts_remaining(&self) -> bool {
        self.attempts < self.max_attempts
    }
}

/// Data required to enqueue a new job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJob {
    /// Job type tag.
    pub job_type: String,
    /// Queue name.
    pub queue: String,
    /// Job-specific payload.
    pub payload: serde_json::Value,
    /// Maximum delivery attempts.
    pub max_attempts: i32,
    /// Earliest execution time.
    pub scheduled_at: Option<DateTime<Utc>>,
}
