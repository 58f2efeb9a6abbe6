//! Paystack billing gateway.

use async_trait::async_trait;

use paperjet_core::config::billing::PaystackConfig;
use paperjet_core::error::{AppError, ErrorKind};
use paperjet_core::result::AppResult;
use paperjet_core::traits::billing::{BillingGateway, CancelSubscription};

/// Paystack client. Disabling a subscription is
/// `POST /subscription/disable` with the subscription code and the
/// customer's email token.
#[derive(Debug, Clone)]
pub struct PaystackGateway {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl PaystackGateway {
    /// Create a new Paystack gateway from configuration.
    pub fn new(config: &PaystackConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        }
    }
}

#[async_trait]
impl BillingGateway for PaystackGateway {
    fn platform(&self) -> &str {
        "paystack"
    }

    async fn cancel_subscription(&self, req: &CancelSubscription) -> AppResult<bool> {
        // Paystack needs both identifiers; without the token there is
        // nothing we can disable.
        let Some(token) = req.email_token.as_deref() else {
            return Ok(false);
        };
        if req.provider_code.is_empty() {
            return Ok(false);
        }

        let url = format!("{}/subscription/disable", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .json(&serde_json::json!({
                "code": req.provider_code,
                "token": token,
            }))
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    "Paystack disable request failed",
                    e,
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(format!(
                "Paystack disable rejected ({status}): {body}"
            )));
        }

        tracing::info!(subscription = %req.provider_code, "Paystack subscription disabled");
        Ok(true)
    }
}
