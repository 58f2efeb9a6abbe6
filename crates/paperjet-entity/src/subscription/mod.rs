//! Subscription entity and its status state machine.

pub mod model;
pub mod status;

pub use model::Subscription;
pub use status::{PaymentPlatform, SubscriptionStatus};
