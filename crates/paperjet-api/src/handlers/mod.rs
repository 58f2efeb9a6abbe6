//! HTTP handlers.

pub mod document;
pub mod health;
pub mod job;
pub mod subscription;
