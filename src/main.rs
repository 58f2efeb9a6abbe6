//! Paperjet Server — asynchronous job-orchestration backend.
//!
//! Main entry point that wires config, database, storage, billing, the
//! worker roles, and the HTTP transport together.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use paperjet_core::config::AppConfig;
use paperjet_core::error::AppError;

use paperjet_billing::BillingDispatch;
use paperjet_database::repositories::document::DocumentRepository;
use paperjet_database::repositories::job::JobRepository;
use paperjet_database::repositories::plan::PlanRepository;
use paperjet_database::repositories::subscription::SubscriptionRepository;
use paperjet_worker::jobs::{
    DocumentUploadJobHandler, JobSweepHandler, SubscriptionCancellationJobHandler,
    SubscriptionExpirationJobHandler,
};
use paperjet_worker::{CronScheduler, JobHandler, JobProducer, JobQueue, WorkerRunner};

#[tokio::main]
async fn main() {
    let env = std::env::var("PAPERJET_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Paperjet v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Create data directories ──────────────────────────
    create_data_directories(&config).await?;

    // ── Step 2: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let pool = paperjet_database::connect(&config.database).await?;

    tracing::info!("Running database migrations...");
    paperjet_database::migration::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    // ── Step 3: Object store ─────────────────────────────────────
    tracing::info!(
        "Initializing object store (provider: {})...",
        config.storage.provider
    );
    let objects = paperjet_storage::factory::build_object_store(&config.storage).await?;

    // ── Step 4: Billing gateways ─────────────────────────────────
    let billing = Arc::new(BillingDispatch::from_config(&config.billing));

    // ── Step 5: Repositories ─────────────────────────────────────
    let job_repo = Arc::new(JobRepository::new(pool.clone()));
    let subscription_repo = Arc::new(SubscriptionRepository::new(pool.clone()));
    let plan_repo = Arc::new(PlanRepository::new(pool.clone()));
    let document_repo = Arc::new(DocumentRepository::new(pool.clone()));

    // ── Step 6: Queue facade and producers ───────────────────────
    let worker_id = format!("worker-{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let queue = Arc::new(JobQueue::new(
        Arc::clone(&job_repo) as _,
        config.worker.clone(),
        worker_id,
    ));
    let staging_root = PathBuf::from(&config.storage.staging_root);
    let producer = Arc::new(JobProducer::new(Arc::clone(&queue), staging_root.clone()));

    // ── Step 7: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 8: Worker roles + scheduler ─────────────────────────
    let mut worker_handles = Vec::new();
    let scheduler = if config.worker.enabled {
        tracing::info!("Starting worker roles...");

        let handlers: Vec<Arc<dyn JobHandler>> = vec![
            Arc::new(DocumentUploadJobHandler::new(
                staging_root.clone(),
                Arc::clone(&objects),
                Arc::clone(&document_repo) as _,
            )),
            Arc::new(SubscriptionExpirationJobHandler::new(
                Arc::clone(&subscription_repo) as _,
                Arc::clone(&plan_repo) as _,
                Arc::clone(&billing),
                config.plans.free_plan_name.clone(),
            )),
            Arc::new(SubscriptionCancellationJobHandler::new(
                Arc::clone(&subscription_repo) as _,
                Arc::clone(&plan_repo) as _,
                config.plans.free_plan_name.clone(),
            )),
            Arc::new(JobSweepHandler::new(Arc::clone(&queue))),
        ];

        let poll_interval = Duration::from_secs(config.worker.poll_interval_seconds);
        for handler in handlers {
            let runner = WorkerRunner::new(Arc::clone(&queue), handler, poll_interval);
            let cancel = shutdown_rx.clone();
            worker_handles.push(tokio::spawn(async move {
                runner.run(cancel).await;
            }));
        }

        let scheduler = CronScheduler::new(Arc::clone(&queue)).await?;
        scheduler.register_default_tasks().await?;
        scheduler.start().await?;

        tracing::info!("Worker roles started");
        Some(scheduler)
    } else {
        tracing::info!("Workers disabled");
        None
    };

    // ── Step 9: HTTP server ──────────────────────────────────────
    let app_state = paperjet_api::AppState {
        config: Arc::new(config.clone()),
        objects: Arc::clone(&objects),
        document_repo: Arc::clone(&document_repo),
        subscription_repo: Arc::clone(&subscription_repo),
        producer: Arc::clone(&producer),
        queue: Arc::clone(&queue),
    };

    let app = paperjet_api::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Paperjet server listening on {}", addr);

    // ── Step 10: Graceful shutdown ───────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 11: Wait for background tasks ───────────────────────
    tracing::info!("Waiting for worker roles to complete...");

    if let Some(mut scheduler) = scheduler {
        let _ = scheduler.shutdown().await;
    }
    for handle in worker_handles {
        let _ = tokio::time::timeout(Duration::from_secs(30), handle).await;
    }

    pool.close().await;
    tracing::info!("Database pool closed");

    tracing::info!("Paperjet server shut down gracefully");
    Ok(())
}

/// Create required data directories
async fn create_data_directories(config: &AppConfig) -> Result<(), AppError> {
    let mut dirs = vec![config.storage.staging_root.clone()];
    if config.storage.provider == "local" {
        dirs.push(config.storage.local.root_path.clone());
    }

    for dir in &dirs {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::internal(format!("Failed to create dir '{}': {}", dir, e)))?;
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
