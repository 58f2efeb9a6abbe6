//! Gateway selection by payment platform.

use std::collections::HashMap;
use std::sync::Arc;

use paperjet_core::config::billing::BillingConfig;
use paperjet_core::traits::billing::BillingGateway;

use crate::{PaystackGateway, StripeGateway};

/// Holds the configured billing gateways, keyed by platform name.
///
/// A platform with no configured gateway simply yields `None`; callers
/// treat that as "nothing to cancel".
#[derive(Debug, Default)]
pub struct BillingDispatch {
    gateways: HashMap<String, Arc<dyn BillingGateway>>,
}

impl BillingDispatch {
    /// Build the dispatch table from configuration, constructing only
    /// the gateways that are enabled.
    pub fn from_config(config: &BillingConfig) -> Self {
        let mut dispatch = Self::default();
        if config.stripe.enabled {
            dispatch.register(Arc::new(StripeGateway::new(&config.stripe)));
        }
        if config.paystack.enabled {
            dispatch.register(Arc::new(PaystackGateway::new(&config.paystack)));
        }
        dispatch
    }

    /// Register a gateway under its platform name.
    pub fn register(&mut self, gateway: Arc<dyn BillingGateway>) {
        let platform = gateway.platform().to_string();
        tracing::info!("Registered billing gateway for platform '{platform}'");
        self.gateways.insert(platform, gateway);
    }

    /// Look up the gateway for a platform, if one is configured.
    pub fn for_platform(&self, platform: &str) -> Option<&Arc<dyn BillingGateway>> {
        self.gateways.get(platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperjet_core::config::billing::{PaystackConfig, StripeConfig};

    #[test]
    fn test_disabled_gateways_not_registered() {
        let dispatch = BillingDispatch::from_config(&BillingConfig::default());
        assert!(dispatch.for_platform("stripe").is_none());
        assert!(dispatch.for_platform("paystack").is_none());
    }

    #[test]
    fn test_enabled_gateways_registered() {
        let config = BillingConfig {
            stripe: StripeConfig {
                enabled: true,
                secret_key: "sk_test".into(),
                base_url: "https://api.stripe.com".into(),
            },
            paystack: PaystackConfig {
                enabled: false,
                ..Default::default()
            },
        };
        let dispatch = BillingDispatch::from_config(&config);
        assert!(dispatch.for_platform("stripe").is_some());
        assert!(dispatch.for_platform("paystack").is_none());
    }
}
