//! Built-in job handlers.
//!
//! Handlers depend on narrow traits rather than concrete repositories so
//! they can be exercised against in-memory fakes; the real repositories
//! implement the traits below.

pub mod cancellation;
pub mod expiration;
pub mod sweep;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use uuid::Uuid;

use paperjet_core::result::AppResult;
use paperjet_database::repositories::plan::PlanRepository;
use paperjet_database::repositories::subscription::SubscriptionRepository;
use paperjet_entity::plan::Plan;
use paperjet_entity::subscription::Subscription;
use paperjet_entity::subscription::status::SubscriptionStatus;

pub use cancellation::SubscriptionCancellationJobHandler;
pub use expiration::SubscriptionExpirationJobHandler;
pub use sweep::JobSweepHandler;
pub use upload::DocumentUploadJobHandler;

/// Subscription reads and transition-checked writes, as the handlers
/// need them.
#[async_trait]
pub trait SubscriptionStore: Send + Sync + std::fmt::Debug {
    /// Find a subscription by its owning user.
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<Subscription>>;

    /// Move a subscription to `next` and reassign its plan, enforcing
    /// the transition table.
    async fn transition(
        &self,
        user_id: Uuid,
        next: SubscriptionStatus,
        plan_id: Uuid,
    ) -> AppResult<Subscription>;
}

#[async_trait]
impl SubscriptionStore for SubscriptionRepository {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        SubscriptionRepository::find_by_user(self, user_id).await
    }

    async fn transition(
        &self,
        user_id: Uuid,
        next: SubscriptionStatus,
        plan_id: Uuid,
    ) -> AppResult<Subscription> {
        SubscriptionRepository::transition(self, user_id, next, plan_id).await
    }
}

/// Plan reference-data lookups.
#[async_trait]
pub trait PlanDirectory: Send + Sync + std::fmt::Debug {
    /// Find a plan by name (case-insensitive).
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Plan>>;
}

#[async_trait]
impl PlanDirectory for PlanRepository {
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Plan>> {
        PlanRepository::find_by_name(self, name).await
    }
}
