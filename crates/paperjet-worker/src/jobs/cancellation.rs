//! Subscription cancellation job handler.
//!
//! A cancellation becomes effective at its end date: the subscription
//! keeps running until then. A job claimed before the end date is
//! deferred back to the queue, scheduled for exactly when the
//! cancellation is due; once due, the subscription is finalized onto the
//! free-tier plan.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use paperjet_entity::job::model::Job;
use paperjet_entity::job::payload::{JobPayload, queues};
use paperjet_entity::subscription::status::SubscriptionStatus;

use crate::handler::{JobError, JobHandler, JobOutcome};
use crate::jobs::{PlanDirectory, SubscriptionStore};

/// Handles subscription cancellation jobs.
#[derive(Debug)]
pub struct SubscriptionCancellationJobHandler {
    /// Subscription store.
    subscriptions: Arc<dyn SubscriptionStore>,
    /// Plan reference data.
    plans: Arc<dyn PlanDirectory>,
    /// Name of the free-tier plan cancelled users land on.
    free_plan_name: String,
}

impl SubscriptionCancellationJobHandler {
    /// Create a new subscription cancellation handler.
    pub fn new(
        subscriptions: Arc<dyn SubscriptionStore>,
        plans: Arc<dyn PlanDirectory>,
        free_plan_name: String,
    ) -> Self {
        Self {
            subscriptions,
            plans,
            free_plan_name,
        }
    }
}

#[async_trait]
impl JobHandler for SubscriptionCancellationJobHandler {
    fn queue(&self) -> &str {
        queues::SUBSCRIPTION_CANCELLATION
    }

    async fn execute(&self, job: &Job) -> Result<JobOutcome, JobError> {
        let payload = job
            .typed_payload()
            .map_err(|e| JobError::Permanent(format!("Malformed job payload: {e}")))?;

        let JobPayload::SubscriptionCancellation { user_id, end_date } = payload else {
            return Err(JobError::Permanent(format!(
                "Payload type '{}' does not belong on queue '{}'",
                job.job_type, job.queue
            )));
        };

        if Utc::now() < end_date {
            tracing::info!(
                "Cancellation for user {} not due until {}, deferring",
                user_id,
                end_date
            );
            return Ok(JobOutcome::Deferred(end_date));
        }

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

        self.subscriptions
            .transition(user_id, SubscriptionStatus::Cancelled, free_plan.id)
            .await?;

        tracing::info!(
            "Subscription cancelled for user {}, moved to plan '{}'",
            user_id,
            free_plan.name
        );

        Ok(JobOutcome::Completed(Some(serde_json::json!({
            "success": true,
            "message": "cancelled",
            "user_id": user_id,
        }))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, Duration};
    use uuid::Uuid;

    use paperjet_entity::job::status::JobStatus;

    use crate::jobs::testing::{FakePlans, FakeSubscriptions, subscription};

    fn cancellation_job(user_id: Uuid, end_date: DateTime<Utc>) -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            job_type: "subscription_cancellation".into(),
            queue: queues::SUBSCRIPTION_CANCELLATION.into(),
            payload: serde_json::to_value(JobPayload::SubscriptionCancellation {
                user_id,
                end_date,
            })
            .unwrap(),
            result: None,
            error_message: None,
            status: JobStatus::Running,
            attempts: 1,
            max_attempts: 3,
            scheduled_at: None,
            started_at: Some(now),
            completed_at: None,
            lease_expires_at: None,
            worker_id: Some("test-worker".into()),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_due_cancellation_finalizes_onto_free_plan() {
        let user_id = Uuid::new_v4();
        let free_plan_id = Uuid::new_v4();
        let subscriptions =
            FakeSubscriptions::with(subscription(user_id, SubscriptionStatus::Cancelling));
        let handler = SubscriptionCancellationJobHandler::new(
            Arc::clone(&subscriptions) as Arc<dyn SubscriptionStore>,
            FakePlans::with_free_plan(free_plan_id),
            "Free".into(),
        );

        let end_date = Utc::now() - Duration::hours(1);
        let outcome = handler
            .execute(&cancellation_job(user_id, end_date))
            .await
            .unwrap();

        match outcome {
            JobOutcome::Completed(Some(result)) => {
                assert_eq!(result["success"], true);
                assert_eq!(result["message"], "cancelled");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(
            subscriptions.status_of(user_id),
            SubscriptionStatus::Cancelled
        );
        assert_eq!(subscriptions.plan_of(user_id), free_plan_id);
    }

    #[tokio::test]
    async fn test_future_cancellation_deferred_and_row_untouched() {
        let user_id = Uuid::new_v4();
        let row = subscription(user_id, SubscriptionStatus::Cancelling);
        let original_plan = row.plan_id;
        let subscriptions = FakeSubscriptions::with(row);
        let handler = SubscriptionCancellationJobHandler::new(
            Arc::clone(&subscriptions) as Arc<dyn SubscriptionStore>,
            FakePlans::with_free_plan(Uuid::new_v4()),
            "Free".into(),
        );

        let end_date = Utc::now() + Duration::days(7);
        let outcome = handler
            .execute(&cancellation_job(user_id, end_date))
            .await
            .unwrap();

        assert_eq!(outcome, JobOutcome::Deferred(end_date));
        assert_eq!(
            subscriptions.status_of(user_id),
            SubscriptionStatus::Cancelling
        );
        assert_eq!(subscriptions.plan_of(user_id), original_plan);
    }

    #[tokio::test]
    async fn test_missing_free_plan_is_permanent() {
        let user_id = Uuid::new_v4();
        let subscriptions =
            FakeSubscriptions::with(subscription(user_id, SubscriptionStatus::Cancelling));
        let handler = SubscriptionCancellationJobHandler::new(
            subscriptions as Arc<dyn SubscriptionStore>,
            Arc::new(FakePlans::default()),
            "Free".into(),
        );

        let end_date = Utc::now() - Duration::hours(1);
        let err = handler
            .execute(&cancellation_job(user_id, end_date))
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Permanent(_)));
    }
}
