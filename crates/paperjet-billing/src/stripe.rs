//! Stripe billing gateway.

use async_trait::async_trait;

use paperjet_core::config::billing::StripeConfig;
use paperjet_core::error::{AppError, ErrorKind};
use paperjet_core::result::AppResult;
use paperjet_core::traits::billing::{BillingGateway, CancelSubscription};

/// Stripe client. Cancelling a subscription is
/// `DELETE /v1/subscriptions/{id}` with bearer auth.
#[derive(Debug, Clone)]
pub struct StripeGateway {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl StripeGateway {
    /// Create a new Stripe gateway from configuration.
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        }
    }
}

#[async_trait]
impl BillingGateway for StripeGateway {
    fn platform(&self) -> &str {
        "stripe"
    }

    async fn cancel_subscription(&self, req: &CancelSubscription) -> AppResult<bool> {
        if req.provider_code.is_empty() {
            return Ok(false);
        }

        let url = format!("{}/v1/subscriptions/{}", self.base_url, req.provider_code);
        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    "Stripe cancellation request failed",
                    e,
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(format!(
                "Stripe cancellation rejected ({status}): {body}"
            )));
        }

        tracing::info!(subscription = %req.provider_code, "Stripe subscription cancelled");
        Ok(true)
    }
}
