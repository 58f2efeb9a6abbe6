//! Subscription entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::{PaymentPlatform, SubscriptionStatus};

/// A user's subscription record, mutated only by the subscription workers.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    /// Owning user (one subscription per user).
    pub user_id: Uuid,
    /// Current plan.
    pub plan_id: Uuid,
    /// Current lifecycle status.
    pub status: SubscriptionStatus,
    /// Platform the subscription is billed through, if any.
    pub payment_platform: Option<PaymentPlatform>,
    /// Provider-assigned subscription code (for billing cancellation).
    pub provider_code: Option<String>,
    /// Paystack email token, required alongside the code to disable.
    pub email_token: Option<String>,
    /// When cancellation was requested.
    pub cancellation_date: Option<DateTime<Utc>>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}
