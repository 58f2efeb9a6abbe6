//! Subscription expiration job handler.
//!
//! A subscription whose paid period ran out is moved to the expired
//! status on the free-tier plan. If the subscription is still registered
//! with a payment provider, the provider-side record is cancelled on a
//! best-effort basis; a failed provider call never fails the job.

use std::sync::Arc;

use async_trait::async_trait;

use paperjet_billing::BillingDispatch;
use paperjet_core::traits::billing::CancelSubscription;
use paperjet_entity::job::model::Job;
use paperjet_entity::job::payload::{JobPayload, queues};
use paperjet_entity::subscription::Subscription;
use paperjet_entity::subscription::status::SubscriptionStatus;

use crate::handler::{JobError, JobHandler, JobOutcome};
use crate::jobs::{PlanDirectory, SubscriptionStore};

/// Handles subscription expiration jobs.
#[derive(Debug)]
pub struct SubscriptionExpirationJobHandler {
    /// Subscription store.
    subscriptions: Arc<dyn SubscriptionStore>,
    /// Plan reference data.
    plans: Arc<dyn PlanDirectory>,
    /// Billing gateways, used best-effort only.
    billing: Arc<BillingDispatch>,
    /// Name of the free-tier plan expired users land on.
    free_plan_name: String,
}

impl SubscriptionExpirationJobHandler {
    /// Create a new subscription expiration handler.
    pub fn new(
        subscriptions: Arc<dyn SubscriptionStore>,
        plans: Arc<dyn PlanDirectory>,
        billing: Arc<BillingDispatch>,
        free_plan_name: String,
    ) -> Self {
        Self {
            subscriptions,
            plans,
            billing,
            free_plan_name,
        }
    }

    /// Cancel the provider-side subscription record, best-effort.
    async fn cancel_with_provider(&self, subscription: &Subscription) {
        let (Some(platform), Some(code)) = (
            subscription.payment_platform,
            subscription.provider_code.as_deref(),
        ) else {
            return;
        };

        let Some(gateway) = self.billing.for_platform(platform.as_str()) else {
            tracing::debug!(
                "No billing gateway configured for platform '{}', skipping provider cancellation",
                platform
            );
            return;
        };

        let request = CancelSubscription {
            provider_code: code.to_string(),
            email_token: subscription.email_token.clone(),
        };

        match gateway.cancel_subscription(&request).await {
            Ok(true) => tracing::info!(
                "Cancelled {} subscription '{}' for user {}",
                platform,
                code,
                subscription.user_id
            ),
            Ok(false) => tracing::debug!(
                "Nothing to cancel with {} for user {}",
                platform,
                subscription.user_id
            ),
            Err(e) => tracing::warn!(
                "Provider cancellation failed for user {} on {}: {}",
                subscription.user_id,
                platform,
                e
            ),
        }
    }
}

#[async_trait]
impl JobHandler for SubscriptionExpirationJobHandler {
    fn queue(&self) -> &str {
        queues::SUBSCRIPTION_EXPIRATION
    }

    async fn execute(&self, job: &Job) -> Result<JobOutcome, JobError> {
        let payload = job
            .typed_payload()
            .map_err(|e| JobError::Permanent(format!("Malformed job payload: {e}")))?;

        let JobPayload::SubscriptionExpiration { user_id, email } = payload else {
            return Err(JobError::Permanent(format!(
                "Payload type '{}' does not belong on queue '{}'",
                job.job_type, job.queue
            )));
        };

        // A missing free plan is a provisioning problem; retrying forever
        // only hides it.
        let free_plan = self
            .plans
            .find_by_name(&self.free_plan_name)
            .await?
            .ok_or_else(|| {
                JobError::Permanent(format!(
                    "Free plan '{}' is not provisioned",
                    self.free_plan_name
                ))
            })?;

        let subscription = self
            .subscriptions
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| {
                JobError::Permanent(format!("No subscription for user {user_id}"))
            })?;

        // Terminal write first; re-running a redelivered job re-writes
        // the same fields.
        self.subscriptions
            .transition(user_id, SubscriptionStatus::Expired, free_plan.id)
            .await?;

        tracing::info!(
            "Subscription expired for user {} ({}), moved to plan '{}'",
            user_id,
            email,
            free_plan.name
        );

        self.cancel_with_provider(&subscription).await;

        Ok(JobOutcome::Completed(Some(serde_json::json!({
            "success": true,
            "status": "expired",
            "user_id": user_id,
        }))))
    }
}
