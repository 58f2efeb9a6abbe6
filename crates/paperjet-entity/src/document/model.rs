//! Uploaded document entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An uploaded document record.
///
/// Created by the upload-initiation handler with a local staged path;
/// the upload worker overwrites `file_path` exactly once with the object
/// store's public URL. On failure the row keeps the local path so the job
/// stays retryable and inspectable.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    /// Unique document identifier.
    pub id: Uuid,
    /// Original file name as uploaded.
    pub file_name: String,
    /// Staged local path, replaced by the public URL after upload.
    pub file_path: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}
