//! Job status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a background job.
///
/// Lifecycle: `pending → running → completed`, or `running → pending`
/// again on a transient failure / expired lease, or `running → dead`
/// once the retry budget is exhausted (or immediately on a permanent
/// failure). `dead` is the dead-letter terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting to be claimed by a worker (possibly scheduled for later).
    Pending,
    /// Claimed and currently being processed under a lease.
    Running,
    /// Successfully completed.
    Completed,
    /// Dead-lettered: failed permanently or exhausted its retry budget.
    Dead,
    /// Manually cancelled by an operator.
    Cancelled,
}

impl JobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Dead | Self::Cancelled)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Dead => "dead",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
