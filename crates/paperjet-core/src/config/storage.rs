//! Storage provider configuration.

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory where HTTP handlers stage uploaded files before the
    /// upload worker moves them to the object store. All staged paths in
    /// job payloads must resolve inside this directory.
    #[serde(default = "default_staging_root")]
    pub staging_root: String,
    /// Object store provider to use: `"local"` or `"s3"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Maximum upload size in bytes (default 50 MB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Local filesystem object store configuration.
    #[serde(default)]
    pub local: LocalStorageConfig,
    /// S3-compatible object store configuration.
    #[serde(default)]
    pub s3: S3StorageConfig,
}

/// Local filesystem object store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Root path for locally stored objects.
    #[serde(default = "default_local_root")]
    pub root_path: String,
    /// Base URL under which stored objects are publicly served.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
            public_base_url: default_public_base_url(),
        }
    }
}

/// S3-compatible object store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct S3StorageConfig {
    /// S3 endpoint URL (for non-AWS services like MinIO). Empty = AWS.
    #[serde(default)]
    pub endpoint: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// S3 bucket name.
    #[serde(default)]
    pub bucket: String,
    /// Access key ID.
    #[serde(default)]
    pub access_key: String,
    /// Secret access key.
    #[serde(default)]
    pub secret_key: String,
}

fn default_staging_root() -> String {
    "./data/staging".to_string()
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_max_upload() -> u64 {
    52_428_800 // 50 MB
}

fn default_local_root() -> String {
    "./data/objects".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:4000/objects".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}
