//! # paperjet-api
//!
//! Thin HTTP transport over the job producers. Handlers stage input,
//! enqueue a typed job, and return immediately; the response is always
//! "job accepted" or a synchronous enqueue failure. All processing
//! happens in the workers.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
