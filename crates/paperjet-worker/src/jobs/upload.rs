//! Document upload job handler.
//!
//! Moves a staged file into the object store and records the resulting
//! public URL on the document row. Steps: validate the staged path,
//! read the staged bytes, put them under a key derived from the job's
//! enqueue time, record the URL. Each step classifies its failures so
//! the queue's retry policy does the right thing.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use paperjet_core::error::ErrorKind;
use paperjet_core::result::AppResult;
use paperjet_core::traits::ObjectStore;
use paperjet_database::repositories::document::DocumentRepository;
use paperjet_entity::job::model::Job;
use paperjet_entity::job::payload::{JobPayload, queues};
use paperjet_storage::naming::destination_key;
use paperjet_storage::staging::resolve_staged_path;

use crate::handler::{JobError, JobHandler, JobOutcome};

/// Document metadata writes, as the upload handler needs them.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Overwrite the document's path with its public URL.
    async fn record_public_url(&self, id: Uuid, public_url: &str) -> AppResult<()>;
}

#[async_trait]
impl DocumentStore for DocumentRepository {
    async fn record_public_url(&self, id: Uuid, public_url: &str) -> AppResult<()> {
        DocumentRepository::record_public_url(self, id, public_url).await
    }
}

/// Handles document upload jobs.
#[derive(Debug)]
pub struct DocumentUploadJobHandler {
    /// Staging root the payload's path must resolve inside.
    staging_root: PathBuf,
    /// Destination object store.
    objects: Arc<dyn ObjectStore>,
    /// Document metadata store.
    documents: Arc<dyn DocumentStore>,
}

impl DocumentUploadJobHandler {
    /// Create a new document upload handler.
    pub fn new(
        staging_root: PathBuf,
        objects: Arc<dyn ObjectStore>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            staging_root,
            objects,
            documents,
        }
    }
}

#[async_trait]
impl JobHandler for DocumentUploadJobHandler {
    fn queue(&self) -> &str {
        queues::DOCUMENT_UPLOAD
    }

    async fn execute(&self, job: &Job) -> Result<JobOutcome, JobError> {
        let payload = job
            .typed_payload()
            .map_err(|e| JobError::Permanent(format!("Malformed job payload: {e}")))?;

        let JobPayload::DocumentUpload {
            document_id,
            staged_path,
        } = payload
        else {
            return Err(JobError::Permanent(format!(
                "Payload type '{}' does not belong on queue '{}'",
                job.job_type, job.queue
            )));
        };

        // Producers validated this already; re-resolving here keeps a
        // tampered row from escaping the staging directory.
        let local_path = resolve_staged_path(&self.staging_root, &staged_path)
            .map_err(|e| JobError::Permanent(e.to_string()))?;

        let data = match tokio::fs::read(&local_path).await {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // The staged file may still be landing on shared storage.
                return Err(JobError::Transient(format!(
                    "Staged file not found: {staged_path}"
                )));
            }
            Err(e) => {
                return Err(JobError::Transient(format!(
                    "Failed to read staged file {staged_path}: {e}"
                )));
            }
        };

        // Keyed off the job's enqueue time: a redelivered job recomputes
        // the same key and the put overwrites instead of duplicating.
        let key = destination_key(job.created_at, &staged_path);

        tracing::info!(
            "Uploading document {}: staged='{}', key='{}', bytes={}",
            document_id,
            staged_path,
            key,
            data.len()
        );

        self.objects
            .put(&key, data, None)
            .await
            .map_err(|e| JobError::Transient(format!("Object store upload failed: {e}")))?;

        let public_url = self.objects.public_url(&key);

        self.documents
            .record_public_url(document_id, &public_url)
            .await
            .map_err(|e| match e.kind {
                ErrorKind::NotFound => JobError::Permanent(e.to_string()),
                _ => JobError::Transient(format!("Failed to record document URL: {e}")),
            })?;

        // The object is durable and recorded; the staged copy is now junk.
        if let Err(e) = tokio::fs::remove_file(&local_path).await {
            tracing::warn!(
                "Failed to delete staged file '{}' after upload: {}",
                local_path.display(),
                e
            );
        }

        tracing::info!("Document {} uploaded to '{}'", document_id, public_url);

        Ok(JobOutcome::Completed(Some(serde_json::json!({
            "success": true,
            "document_id": document_id,
            "public_url": public_url,
        }))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::Utc;

    use paperjet_core::error::AppError;
    use paperjet_entity::job::status::JobStatus;

    #[derive(Debug, Default)]
    struct MemoryObjectStore {
        objects: Mutex<HashMap<String, Bytes>>,
        fail_puts: AtomicBool,
    }

    #[async_trait]
    impl ObjectStore for MemoryObjectStore {
        fn provider_type(&self) -> &str {
            "memory"
        }

        async fn health_check(&self) -> AppResult<bool> {
            Ok(true)
        }

        async fn put(&self, key: &str, data: Bytes, _content_type: Option<&str>) -> AppResult<()> {
            if self.fail_puts.load(Ordering::SeqCst) {
                return Err(AppError::storage("put failed"));
            }
            self.objects.lock().unwrap().insert(key.to_string(), data);
            Ok(())
        }

        async fn get(&self, key: &str) -> AppResult<Bytes> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| AppError::not_found(format!("No object at {key}")))
        }

        async fn exists(&self, key: &str) -> AppResult<bool> {
            Ok(self.objects.lock().unwrap().contains_key(key))
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("http://objects.test/{key}")
        }
    }

    #[derive(Debug, Default)]
    struct FakeDocuments {
        urls: Mutex<HashMap<Uuid, String>>,
        fail_writes: AtomicBool,
    }

    #[async_trait]
    impl DocumentStore for FakeDocuments {
        async fn record_public_url(&self, id: Uuid, public_url: &str) -> AppResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(AppError::database("update failed"));
            }
            self.urls.lock().unwrap().insert(id, public_url.to_string());
            Ok(())
        }
    }

    fn upload_job(document_id: Uuid, staged_path: &str) -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            job_type: "document_upload".into(),
            queue: queues::DOCUMENT_UPLOAD.into(),
            payload: serde_json::to_value(JobPayload::DocumentUpload {
                document_id,
                staged_path: staged_path.into(),
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

    fn handler(
        staging_root: PathBuf,
    ) -> (
        DocumentUploadJobHandler,
        Arc<MemoryObjectStore>,
        Arc<FakeDocuments>,
    ) {
        let objects = Arc::new(MemoryObjectStore::default());
        let documents = Arc::new(FakeDocuments::default());
        let handler = DocumentUploadJobHandler::new(
            staging_root,
            Arc::clone(&objects) as Arc<dyn ObjectStore>,
            Arc::clone(&documents) as Arc<dyn DocumentStore>,
        );
        (handler, objects, documents)
    }

    #[tokio::test]
    async fn test_happy_path_records_public_url() {
        let staging = tempfile::tempdir().unwrap();
        let staged = staging.path().join("1700000000000-My Report.PDF");
        std::fs::write(&staged, b"pdf bytes").unwrap();

        let (handler, objects, documents) = handler(staging.path().to_path_buf());
        let document_id = Uuid::new_v4();
        let job = upload_job(document_id, "1700000000000-My Report.PDF");

        let outcome = handler.execute(&job).await.unwrap();

        let expected_key = format!("{}_my_report.pdf", job.created_at.timestamp_millis());
        assert!(objects.exists(&expected_key).await.unwrap());

        let expected_url = format!("http://objects.test/{expected_key}");
        assert_eq!(
            documents.urls.lock().unwrap().get(&document_id),
            Some(&expected_url)
        );

        match outcome {
            JobOutcome::Completed(Some(result)) => {
                assert_eq!(result["success"], true);
                assert_eq!(result["public_url"], expected_url.as_str());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        // Staged copy deleted after success.
        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn test_missing_staged_file_is_transient() {
        let staging = tempfile::tempdir().unwrap();
        let (handler, _, _) = handler(staging.path().to_path_buf());
        let job = upload_job(Uuid::new_v4(), "1700-missing.pdf");

        let err = handler.execute(&job).await.unwrap_err();
        assert!(matches!(err, JobError::Transient(_)));
    }

    #[tokio::test]
    async fn test_storage_failure_is_transient_and_keeps_staged_file() {
        let staging = tempfile::tempdir().unwrap();
        let staged = staging.path().join("1700-report.pdf");
        std::fs::write(&staged, b"pdf bytes").unwrap();

        let (handler, objects, _) = handler(staging.path().to_path_buf());
        objects.fail_puts.store(true, Ordering::SeqCst);
        let job = upload_job(Uuid::new_v4(), "1700-report.pdf");

        let err = handler.execute(&job).await.unwrap_err();
        assert!(matches!(err, JobError::Transient(_)));
        assert!(staged.exists());
    }

    #[tokio::test]
    async fn test_metadata_failure_is_transient_with_object_present() {
        let staging = tempfile::tempdir().unwrap();
        let staged = staging.path().join("1700-report.pdf");
        std::fs::write(&staged, b"pdf bytes").unwrap();

        let (handler, objects, documents) = handler(staging.path().to_path_buf());
        documents.fail_writes.store(true, Ordering::SeqCst);
        let job = upload_job(Uuid::new_v4(), "1700-report.pdf");

        let err = handler.execute(&job).await.unwrap_err();
        assert!(matches!(err, JobError::Transient(_)));

        // Retrying overwrites the same key, then records.
        let expected_key = format!("{}_report.pdf", job.created_at.timestamp_millis());
        assert!(objects.exists(&expected_key).await.unwrap());
        assert!(staged.exists());
    }

    #[tokio::test]
    async fn test_traversal_payload_is_permanent() {
        let staging = tempfile::tempdir().unwrap();
        let (handler, _, _) = handler(staging.path().to_path_buf());
        let job = upload_job(Uuid::new_v4(), "../../etc/passwd");

        let err = handler.execute(&job).await.unwrap_err();
        assert!(matches!(err, JobError::Permanent(_)));
    }

    #[tokio::test]
    async fn test_mismatched_payload_is_permanent() {
        let staging = tempfile::tempdir().unwrap();
        let (handler, _, _) = handler(staging.path().to_path_buf());

        let mut job = upload_job(Uuid::new_v4(), "1700-report.pdf");
        job.payload = serde_json::to_value(JobPayload::JobSweep).unwrap();
        job.job_type = "job_sweep".into();

        let err = handler.execute(&job).await.unwrap_err();
        assert!(matches!(err, JobError::Permanent(_)));
    }
}
