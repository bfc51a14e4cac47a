use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use comicshelf_core::{
    create_account_service, create_authenticator, create_token_issuer, load_config,
    validate_config, AssetLifecycle, Authenticator, CatalogService, FsAssetStorage, ItemStore,
    SqliteItemStore,
};
use comicshelf_server::{create_router, AppState};

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
    let config_path = std::env::var("COMICSHELF_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {}", config.auth.method.as_str());
    info!("Database path: {:?}", config.database.path);

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    let token_issuer =
        create_token_issuer(&config.auth).context("Failed to create token issuer")?;

    // Create SQLite item store
    let item_store: Arc<dyn ItemStore> = Arc::new(
        SqliteItemStore::new(&config.database.path).context("Failed to create item store")?,
    );
    info!("Item store initialized");

    // Create cover storage
    let cover_storage = Arc::new(
        FsAssetStorage::from_config(&config.storage).context("Failed to create cover storage")?,
    );
    info!(
        "Cover storage at {:?}, served under {}",
        cover_storage.root(),
        cover_storage.public_prefix()
    );

    let assets = AssetLifecycle::new(cover_storage)
        .with_max_upload_bytes(config.storage.max_upload_bytes);
    let catalog = Arc::new(
        CatalogService::new(item_store, assets).with_max_tags(config.catalog.max_tags),
    );

    if config.catalog.seed_sample_items {
        catalog
            .seed_samples_if_empty()
            .context("Failed to seed sample items")?;
    }

    // User accounts back login and registration (token auth only)
    let accounts = create_account_service(&config.auth, &config.database.path)
        .context("Failed to create account store")?;
    if let Some(accounts) = &accounts {
        info!("Account store initialized with {} accounts", accounts.count()?);
    }

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        token_issuer,
        accounts,
        catalog,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
