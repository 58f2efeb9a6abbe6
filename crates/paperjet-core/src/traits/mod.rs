//! Traits implemented by Paperjet's external collaborators.

pub mod billing;
pub mod storage;

pub use billing::{BillingGateway, CancelSubscription};
pub use storage::ObjectStore;
