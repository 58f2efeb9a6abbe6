//! # paperjet-database
//!
//! PostgreSQL connection management, migrations, and concrete repository
//! implementations. The `JobRepository` doubles as the durable queue
//! store: jobs live in a table claimed with `FOR UPDATE SKIP LOCKED`
//! under a visibility lease.

pub mod migration;
pub mod pool;
pub mod repositories;

pub use pool::connect;
