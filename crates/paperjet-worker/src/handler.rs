//! Job handler trait and the outcome/error contract between handlers
//! and the runner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use paperjet_core::error::{AppError, ErrorKind};
use paperjet_entity::job::model::Job;

/// Trait for job handler implementations.
///
/// A handler is bound to exactly one queue; the runner claims jobs from
/// `queue()` and dispatches them to `execute`. Delivery is at-least-once,
/// so handlers must tolerate re-execution of an already-applied job.
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// The queue this handler consumes.
    fn queue(&self) -> &str;

    /// Execute a claimed job.
    async fn execute(&self, job: &Job) -> Result<JobOutcome, JobError>;
}

/// Successful handler outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The job's effect was applied; acknowledge with an optional result
    /// payload kept for observability.
    Completed(Option<Value>),
    /// The job is not due yet; hand it back to the queue scheduled for
    /// `until` without consuming a delivery attempt.
    Deferred(DateTime<Utc>),
}

/// Error from job execution.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Permanent failure — dead-letter immediately, retrying cannot help.
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure — retry with backoff until attempts run out.
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Unclassified application error.
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl JobError {
    /// Whether the runner should put the job through the retry schedule.
    ///
    /// Internal errors are classified by kind: infrastructure trouble
    /// (database, storage, remote services) is worth retrying; validation,
    /// configuration, and conflict errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient(_) => true,
            Self::Permanent(_) => false,
            Self::Internal(err) => matches!(
                err.kind,
                ErrorKind::Database
                    | ErrorKind::Storage
                    | ErrorKind::ExternalService
                    | ErrorKind::ServiceUnavailable
                    | ErrorKind::Internal
            ),
        }
    }
}
