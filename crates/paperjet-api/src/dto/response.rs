//! Response DTOs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Acknowledgement that a job was enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobAcceptedResponse {
    /// The enqueued job's identifier.
    pub job_id: Uuid,
    /// The queue the job landed on.
    pub queue: String,
}

/// Acknowledgement that a document was staged and its upload enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAcceptedResponse {
    /// The created document record.
    pub document_id: Uuid,
    /// The enqueued upload job's identifier.
    pub job_id: Uuid,
}

/// Acknowledgement that a pending job was cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCancelledResponse {
    /// The cancelled job's identifier.
    pub job_id: Uuid,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Application version.
    pub version: String,
    /// Object store reachability.
    pub storage: String,
    /// Pending job count.
    pub jobs_pending: i64,
    /// Running job count.
    pub jobs_running: i64,
    /// Dead-lettered job count.
    pub jobs_dead: i64,
}
