//! Concrete repository implementations.

pub mod document;
pub mod job;
pub mod plan;
pub mod subscription;

pub use document::DocumentRepository;
pub use job::JobRepository;
pub use plan::PlanRepository;
pub use subscription::SubscriptionRepository;
