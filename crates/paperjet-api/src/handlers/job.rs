//! Operator job controls.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::dto::response::{ApiResponse, JobCancelledResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/jobs/{job_id}/cancel
///
/// Cancel a job that has not started. A running or terminal job is
/// rejected with a conflict, an unknown id with not-found.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ApiResponse<JobCancelledResponse>>, ApiError> {
    state.queue.cancel(job_id).await?;

    tracing::info!("Job {} cancelled by operator request", job_id);

    Ok(Json(ApiResponse::ok(JobCancelledResponse { job_id })))
}
