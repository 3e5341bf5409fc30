use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidladder_core::{
    load_config, validate_config, ContentStore, Encoder, FfmpegEncoder, PinataStore,
    StoreBackend, TranscodeOrchestrator,
};
use vidladder_server::api::create_router;
use vidladder_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("VIDLADDER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;
    let catalog = config
        .rendition_catalog()
        .context("Invalid rendition ladder")?;

    info!("Configuration loaded successfully");
    info!(
        "Rendition catalog: {}",
        catalog
            .entries()
            .iter()
            .map(|r| format!("{} ({}, {})", r.name, r.frame_size, r.video_bitrate))
            .collect::<Vec<_>>()
            .join(", ")
    );

    // Directory bootstrap
    for dir in [&config.storage.upload_dir, &config.storage.output_root] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory {:?}", dir))?;
    }
    info!(
        "Uploads in {:?}, renditions in {:?}",
        config.storage.upload_dir, config.storage.output_root
    );

    // Create encoder
    let encoder = FfmpegEncoder::new(config.encoder.clone());
    if let Err(e) = encoder.validate().await {
        warn!("Encoder not ready, requests will fail until fixed: {}", e);
    }
    let encoder: Arc<dyn Encoder> = Arc::new(encoder);

    // Create content store
    let store: Arc<dyn ContentStore> = match config.store.backend {
        StoreBackend::Pinata => {
            let pinata = &config.store.pinata;
            if !pinata.has_credentials() {
                warn!("Pinata credentials not configured; every publish will fail");
            }
            info!("Using Pinata store");
            Arc::new(PinataStore::new(pinata.clone()).context("Failed to create Pinata client")?)
        }
    };

    // Create orchestrator
    let orchestrator = Arc::new(TranscodeOrchestrator::new(
        catalog,
        config.storage.output_root.clone(),
        encoder,
        store,
    ));

    // Create app state
    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, orchestrator));

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received");
}
