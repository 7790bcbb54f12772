//! HBNB API Server
//!
//! Serves the REST API on `HBNB_API_HOST:HBNB_API_PORT`, storing records in a
//! JSON file or in SQLite depending on `HBNB_TYPE_STORAGE`.

use anyhow::{Context, Result};
use axum::{extract::Request, ServiceExt};
use hbnb_server::config::Settings;
use hbnb_server::storage;
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    // Initialize tracing; RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting HBNB API Server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    info!("Loading configuration...");
    let settings = Settings::load().context("Failed to load configuration")?;
    info!(
        "Config loaded: bind={}, storage={:?}",
        settings.bind_address(),
        settings.type_storage
    );

    let storage = storage::open(&settings)
        .await
        .context("Failed to initialize storage")?;

    let app = hbnb_server::app(storage);

    let addr: SocketAddr = settings
        .bind_address()
        .parse()
        .context("Failed to parse bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Server listening on {}", addr);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .await
        .context("Server error")?;

    Ok(())
}
