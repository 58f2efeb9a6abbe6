//! Billing gateway trait for payment-provider cancellations.

use async_trait::async_trait;

use crate::result::AppResult;

/// Provider-side identifiers needed to disable a recurring charge.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CancelSubscription {
    /// Provider-assigned subscription code.
    pub provider_code: String,
    /// Additional token some providers require (Paystack's email token).
    pub email_token: Option<String>,
}

/// Trait for payment-provider clients.
///
/// Cancellations are best-effort: workers log a failed call and carry on,
/// they never fail the owning job because of it.
#[async_trait]
pub trait BillingGateway: Send + Sync + std::fmt::Debug + 'static {
    /// Payment platform identifier this gateway serves (e.g., "stripe").
    fn platform(&self) -> &str;

    /// Disable the recurring charge for a subscription.
    ///
    /// Returns `Ok(false)` when there is nothing to cancel (no provider
    /// code on record), `Ok(true)` on a successful cancellation.
    async fn cancel_subscription(&self, req: &CancelSubscription) -> AppResult<bool>;
}
