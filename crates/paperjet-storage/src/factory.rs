//! Object store construction from configuration.

use std::sync::Arc;

use paperjet_core::config::storage::StorageConfig;
use paperjet_core::error::AppError;
use paperjet_core::result::AppResult;
use paperjet_core::traits::storage::ObjectStore;

use crate::providers::{LocalObjectStore, S3ObjectStore};

/// Build the configured object store provider.
pub async fn build_object_store(config: &StorageConfig) -> AppResult<Arc<dyn ObjectStore>> {
    match config.provider.as_str() {
        "local" => Ok(Arc::new(LocalObjectStore::new(&config.local).await?)),
        "s3" => Ok(Arc::new(S3ObjectStore::new(&config.s3).await?)),
        other => Err(AppError::configuration(format!(
            "Unknown storage provider '{other}' (expected 'local' or 's3')"
        ))),
    }
}
