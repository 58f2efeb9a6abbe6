//! Subscription repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use paperjet_core::error::{AppError, ErrorKind};
use paperjet_core::result::AppResult;
use paperjet_entity::subscription::Subscription;
use paperjet_entity::subscription::status::SubscriptionStatus;

/// Repository for subscription reads and transition-checked writes.
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a subscription by its owning user.
    pub async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find subscription", e)
            })
    }

    /// Move a subscription to `next` and reassign its plan, enforcing the
    /// status transition table at write time.
    ///
    /// The guard is in the UPDATE's WHERE clause, so a concurrent writer
    /// cannot slip a backward transition between read and write. Writes
    /// that re-assert the current status succeed (idempotent redelivery);
    /// illegal transitions fail with a conflict.
    pub async fn transition(
        &self,
        user_id: Uuid,
        next: SubscriptionStatus,
        plan_id: Uuid,
    ) -> AppResult<Subscription> {
        let allowed_from = legal_sources(next);

        let updated = sqlx::query_as::<_, Subscription>(
            "UPDATE subscriptions SET status = $2, plan_id = $3, updated_at = NOW() \
             WHERE user_id = $1 AND status = ANY($4) RETURNING *",
        )
        .bind(user_id)
        .bind(next)
        .bind(plan_id)
        .bind(&allowed_from)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update subscription", e)
        })?;

        match updated {
            Some(subscription) => Ok(subscription),
            None => {
                // Distinguish a missing row from a rejected transition.
                let current = self.find_by_user(user_id).await?;
                match current {
                    None => Err(AppError::not_found(format!(
                        "No subscription for user {user_id}"
                    ))),
                    Some(sub) => Err(AppError::conflict(format!(
                        "Illegal subscription transition {} -> {} for user {user_id}",
                        sub.status, next
                    ))),
                }
            }
        }
    }

    /// Record that a cancellation was requested (provider-side disable
    /// succeeded): status moves to cancelling and the request time is kept.
    pub async fn mark_cancelling(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE subscriptions SET status = 'cancelling', cancellation_date = NOW(), \
             updated_at = NOW() WHERE user_id = $1 AND status = 'active'",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark subscription cancelling", e)
        })?;
        Ok(())
    }
}

/// Statuses from which a write to `next` is legal, per the transition
/// table on [`SubscriptionStatus`].
fn legal_sources(next: SubscriptionStatus) -> Vec<SubscriptionStatus> {
    use SubscriptionStatus::*;
    [Active, Cancelling, Cancelled, Expired]
        .into_iter()
        .filter(|from| from.can_transition_to(next))
        .collect()
}
