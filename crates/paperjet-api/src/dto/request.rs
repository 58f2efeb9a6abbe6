//! Request DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body for `POST /api/subscriptions/{user_id}/expire`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpireSubscriptionRequest {
    /// Subscriber email, carried on the job for notification purposes.
    pub email: String,
}

/// Body for `POST /api/subscriptions/{user_id}/cancel`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelSubscriptionRequest {
    /// When the cancellation becomes effective.
    pub end_date: DateTime<Utc>,
}
