//! Plan entity.

pub mod model;

pub use model::Plan;
