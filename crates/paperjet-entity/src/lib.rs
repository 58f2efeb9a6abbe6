//! # paperjet-entity
//!
//! Domain entity models for Paperjet: background jobs and their typed
//! payloads, subscriptions with their status state machine, plans, and
//! uploaded documents.

pub mod document;
pub mod job;
pub mod plan;
pub mod subscription;
