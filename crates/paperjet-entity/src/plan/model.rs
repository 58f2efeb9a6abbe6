//! Plan entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A billing plan. The free-tier plan is looked up by name when a
/// subscription expires or is cancelled.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plan {
    /// Unique plan identifier.
    pub id: Uuid,
    /// Plan display name (e.g., `"Free"`, `"Pro"`).
    pub name: String,
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
}
