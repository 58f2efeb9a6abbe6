//! Plan repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use paperjet_core::error::{AppError, ErrorKind};
use paperjet_core::result::AppResult;
use paperjet_entity::plan::Plan;

/// Repository for plan reference data.
#[derive(Debug, Clone)]
pub struct PlanRepository {
    pool: PgPool,
}

impl PlanRepository {
    /// Create a new plan repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a plan by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Plan>> {
        sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find plan", e))
    }

    /// Find a plan by name (case-insensitive). The free-tier plan is
    /// looked up this way when a subscription winds down.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Plan>> {
        sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find plan by name", e)
            })
    }
}
