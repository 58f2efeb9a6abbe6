//! Background job processing for Paperjet.
//!
//! This crate provides:
//! - A queue facade over the durable job store (typed enqueue, claim,
//!   acknowledgement, retry with exponential backoff, dead-lettering)
//! - The `JobHandler` trait and its outcome/error contract
//! - A per-queue worker runner that processes one job at a time
//! - Typed job producers that validate payloads before enqueue
//! - A cron scheduler for periodic queue maintenance
//! - The built-in job handlers (document upload, subscription
//!   expiration, subscription cancellation, queue sweep)

pub mod handler;
pub mod jobs;
pub mod producers;
pub mod queue;
pub mod runner;
pub mod scheduler;

pub use handler::{JobError, JobHandler, JobOutcome};
pub use producers::JobProducer;
pub use queue::{JobQueue, JobStore, LeaseSweep};
pub use runner::WorkerRunner;
pub use scheduler::CronScheduler;
