//! Application state shared across all handlers.

use std::sync::Arc;

use paperjet_core::config::AppConfig;
use paperjet_core::traits::ObjectStore;
use paperjet_database::repositories::document::DocumentRepository;
use paperjet_database::repositories::subscription::SubscriptionRepository;
use paperjet_worker::{JobProducer, JobQueue};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Object store (health checks).
    pub objects: Arc<dyn ObjectStore>,
    /// Document repository.
    pub document_repo: Arc<DocumentRepository>,
    /// Subscription repository.
    pub subscription_repo: Arc<SubscriptionRepository>,
    /// Typed job producers.
    pub producer: Arc<JobProducer>,
    /// Queue facade (statistics).
    pub queue: Arc<JobQueue>,
}
