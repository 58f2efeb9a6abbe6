//! Subscription lifecycle enqueue endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::dto::request::{CancelSubscriptionRequest, ExpireSubscriptionRequest};
use crate::dto::response::{ApiResponse, JobAcceptedResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/subscriptions/{user_id}/expire
///
/// Enqueue the expiration of a subscription whose paid period ran out.
pub async fn expire_subscription(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<ExpireSubscriptionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<JobAcceptedResponse>>), ApiError> {
    let job = state
        .producer
        .subscription_expiration(user_id, &req.email)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::ok(JobAcceptedResponse {
            job_id: job.id,
            queue: job.queue,
        })),
    ))
}

/// POST /api/subscriptions/{user_id}/cancel
///
/// Marks the subscription as cancelling and enqueues the finalization
/// job, due at the requested end date.
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<CancelSubscriptionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<JobAcceptedResponse>>), ApiError> {
    state.subscription_repo.mark_cancelling(user_id).await?;

    let job = state
        .producer
        .subscription_cancellation(user_id, req.end_date)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::ok(JobAcceptedResponse {
            job_id: job.id,
            queue: job.queue,
        })),
    ))
}
