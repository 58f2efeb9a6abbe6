//! Document repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use paperjet_core::error::{AppError, ErrorKind};
use paperjet_core::result::AppResult;
use paperjet_entity::document::Document;

/// Repository for uploaded document records.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    /// Create a new document repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a document by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Document>> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find document", e))
    }

    /// Create a document record pointing at its staged local path.
    pub async fn create(&self, file_name: &str, staged_path: &str) -> AppResult<Document> {
        sqlx::query_as::<_, Document>(
            "INSERT INTO documents (file_name, file_path) VALUES ($1, $2) RETURNING *",
        )
        .bind(file_name)
        .bind(staged_path)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create document", e))
    }

    /// Overwrite the document's path with the object store's public URL.
    ///
    /// This is the upload worker's single metadata mutation; it is not
    /// run on failure so a failed job leaves the row inspectable.
    pub async fn record_public_url(&self, id: Uuid, public_url: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE documents SET file_path = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(public_url)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record document URL", e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("No document with id {id}")));
        }
        Ok(())
    }
}
