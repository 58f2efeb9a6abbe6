//! # paperjet-core
//!
//! Core crate for Paperjet. Contains the unified error system, configuration
//! schemas, and the traits that decouple workers from their external
//! collaborators (object storage, billing providers).
//!
//! This crate has **no** internal dependencies on other Paperjet crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
