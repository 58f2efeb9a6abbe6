//! # paperjet-storage
//!
//! Object store implementations (local filesystem, S3) behind the
//! [`ObjectStore`](paperjet_core::traits::ObjectStore) trait, plus the
//! destination-key naming scheme and the staging-path traversal guard
//! used by the upload pipeline.

pub mod factory;
pub mod naming;
pub mod providers;
pub mod staging;

pub use factory::build_object_store;
pub use naming::{destination_key, sanitize_file_name};
pub use staging::resolve_staged_path;
