//! Uploaded document entity.

pub mod model;

pub use model::Document;
