mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use foodlink_api::auth::{AppState, AppStateInner};
use foodlink_api::middleware::TokenService;
use foodlink_db::{Database, MemoryStore, Store};

use crate::config::{Config, StorageBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foodlink=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.has_placeholder_secret() {
        warn!("FOODLINK_JWT_SECRET is unset or still a placeholder; set it before deploying");
    }

    let store: Arc<dyn Store> = match config.storage {
        StorageBackend::Sqlite => Arc::new(Database::open(&config.db_path)?),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    info!("Storage backend: {}", config.storage);

    let state: AppState = Arc::new(AppStateInner {
        store,
        tokens: TokenService::new(
            &config.jwt_secret,
            chrono::Duration::hours(config.token_ttl_hours),
        ),
    });

    let app = foodlink_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Host may be a name such as `localhost`, resolved at bind time
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("FoodLink server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("FoodLink server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
