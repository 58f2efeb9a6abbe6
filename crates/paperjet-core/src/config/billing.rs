//! Billing provider configuration.

use serde::{Deserialize, Serialize};

/// Billing provider configuration.
///
/// Billing calls are best-effort: a worker never fails a job because a
/// provider cancellation failed, so missing credentials simply disable
/// the corresponding gateway.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BillingConfig {
    /// Stripe settings.
    #[serde(default)]
    pub stripe: StripeConfig,
    /// Paystack settings.
    #[serde(default)]
    pub paystack: PaystackConfig,
}

/// Stripe gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StripeConfig {
    /// Whether the Stripe gateway is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Secret API key.
    #[serde(default)]
    pub secret_key: String,
    /// API base URL (overridable for tests).
    #[serde(default = "default_stripe_base_url")]
    pub base_url: String,
}

/// Paystack gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaystackConfig {
    /// Whether the Paystack gateway is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Secret API key.
    #[serde(default)]
    pub secret_key: String,
    /// API base URL (overridable for tests).
    #[serde(default = "default_paystack_base_url")]
    pub base_url: String,
}

fn default_stripe_base_url() -> String {
    "https://api.stripe.com".to_string()
}

fn default_paystack_base_url() -> String {
    "https://api.paystack.co".to_string()
}
