//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background job worker configuration.
///
/// Each worker role processes one job at a time; the settings below govern
/// polling, lease visibility, and the retry schedule shared by all roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the workers are enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Interval in seconds between job queue polls when the queue is empty.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Visibility lease in seconds. A claimed job whose lease expires
    /// without acknowledgement becomes redeliverable.
    #[serde(default = "default_lease")]
    pub lease_seconds: u64,
    /// Maximum delivery attempts before a job is dead-lettered.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
    /// Base delay in seconds for the exponential retry backoff.
    #[serde(default = "default_backoff_base")]
    pub retry_backoff_base_seconds: u64,
    /// Days to retain terminal (completed/dead/cancelled) jobs.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    5
}

fn default_lease() -> u64 {
    300
}

fn default_max_attempts() -> i32 {
    3
}

fn default_backoff_base() -> u64 {
    30
}

fn default_retention_days() -> i64 {
    30
}
