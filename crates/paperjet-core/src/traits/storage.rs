//! Object store trait for pluggable storage backends.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Trait for object storage backends.
///
/// Implementations exist for the local filesystem and S3-compatible
/// services. The trait is defined here in `paperjet-core` and implemented
/// in `paperjet-storage`; workers only ever see this interface.
///
/// `put` must be an overwrite: redelivered upload jobs write the same key
/// again and rely on the second write being harmless.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "s3").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Store an object under the given key, overwriting any existing object.
    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> AppResult<()>;

    /// Read an object into memory as a complete byte vector.
    async fn get(&self, key: &str) -> AppResult<Bytes>;

    /// Check whether an object exists at the given key.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Delete the object at the given key (no-op if absent).
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Return the public URL under which the object at `key` is served.
    fn public_url(&self, key: &str) -> String;
}
