//! Background job entity.

pub mod model;
pub mod payload;
pub mod status;

pub use model::{CreateJob, Job};
pub use payload::{JobPayload, queues};
pub use status::JobStatus;
