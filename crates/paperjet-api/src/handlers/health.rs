//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/health
pub async fn health(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    let storage = match state.objects.health_check().await {
        Ok(true) => "available",
        _ => "unavailable",
    };

    let stats = state.queue.stats().await?;

    Ok(Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: storage.to_string(),
        jobs_pending: stats.pending,
        jobs_running: stats.running,
        jobs_dead: stats.dead,
    })))
}
