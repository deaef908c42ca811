use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transfer_portal::{
    api,
    config::{Config, StorageBackend},
    geocode,
    object_store as obj,
    session::SessionStore,
    storage::Database,
    AppState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "transfer-portal starting");

    // Load configuration
    let config = Config::load()?;

    // Open the reference database and apply the seed file, if any
    let db = Database::open(&config.server.data_dir)?;
    info!("Reference database opened at: {}", config.server.data_dir);

    if let Some(ref seed_file) = config.server.reference_seed_file {
        db.load_seed_file(seed_file)?;
        info!("Loaded reference seed from: {seed_file}");
    }

    // Initialize the bronze object store backend
    let object_store: Arc<dyn obj::ObjectStore> = match config.storage.backend {
        StorageBackend::Local => {
            let store = obj::LocalStore::new(&config.storage.local_storage_path)?;
            info!(
                "Using local storage backend at: {}",
                config.storage.local_storage_path
            );
            Arc::new(store)
        }
        StorageBackend::Azure => {
            let account = config
                .storage
                .azure_account
                .as_deref()
                .expect("AZURE_STORAGE_ACCOUNT validated in config");
            let key = config
                .storage
                .azure_key
                .as_deref()
                .expect("AZURE_STORAGE_KEY validated in config");
            let container = config
                .storage
                .bronze_container
                .as_deref()
                .expect("BRONZE_CONTAINER validated in config");
            let store = obj::AzureBlobStore::new(account, key, container)?;
            info!(
                "Using Azure Blob storage backend, container: {container}, folder: {}",
                config.storage.bronze_folder
            );
            Arc::new(store)
        }
    };

    // Initialize the address validator
    let geocoder: Arc<dyn geocode::Geocoder> = if config.geocoding.enabled {
        let api_key = config
            .geocoding
            .api_key
            .as_deref()
            .expect("GEOCODING_API_KEY validated in config");
        info!("Geocoding enabled, endpoint: {}", config.geocoding.endpoint);
        Arc::new(geocode::HttpGeocoder::new(
            &config.geocoding.endpoint,
            api_key,
        )?)
    } else {
        info!("Geocoding disabled; addresses are stored verbatim");
        Arc::new(geocode::PassthroughGeocoder)
    };

    // Create shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        geocoder,
        object_store,
        sessions: SessionStore::new(),
    });

    // Build and start the HTTP server
    let app = api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    info!("Listening on: {}", config.server.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
