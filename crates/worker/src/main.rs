use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reel_core::captions::font::FontDirectory;
use reel_pipeline::capabilities::CaptionFonts;
use reel_pipeline::dispatcher::Dispatcher;
use reel_pipeline::request::UploadSpool;
use reel_pipeline::{watchdog, Capabilities, Orchestrator, PgStatusStore, PipelineConfig};
use reel_providers::ProviderConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reel_worker=debug,reel_pipeline=debug,reel_providers=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = Arc::new(PipelineConfig::from_env());
    let providers = ProviderConfig::from_env();
    tracing::info!(
        max_concurrency = config.max_concurrency,
        fonts = %config.font_dir.display(),
        spool = %config.spool_dir.display(),
        "Loaded pipeline configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = reel_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    reel_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    reel_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    // --- Pipeline ---
    let store = Arc::new(PgStatusStore::new(pool));
    let caps = Capabilities::from_config(&providers).expect("Failed to build HTTP client");
    let orchestrator = Orchestrator::new(
        store.clone(),
        store.clone(),
        Arc::new(caps),
        CaptionFonts::Directory(FontDirectory::new(config.font_dir.clone())),
        UploadSpool::new(config.spool_dir.clone()),
        config.clone(),
    );
    let dispatcher = Dispatcher::new(orchestrator, &config);

    let cancel = CancellationToken::new();
    let watchdog_handle = tokio::spawn(watchdog::run(
        store,
        config.stale_after,
        config.watchdog_interval,
        cancel.clone(),
    ));
    let dispatcher_handle = {
        let cancel = cancel.clone();
        tokio::spawn(async move { dispatcher.run(cancel).await })
    };

    shutdown_signal().await;
    cancel.cancel();

    // The dispatcher returns once in-flight runs have finished.
    if let Err(e) = dispatcher_handle.await {
        tracing::error!(error = %e, "Dispatcher task panicked");
    }
    if let Err(e) = watchdog_handle.await {
        tracing::error!(error = %e, "Watchdog task panicked");
    }
    tracing::info!("Worker stopped");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, draining generations"),
        () = terminate => tracing::info!("Received SIGTERM, draining generations"),
    }
}
