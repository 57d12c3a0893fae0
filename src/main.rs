//! DoctorOnCall: Telemedicine booking backend
//!
//! Main entry point for the HTTP server.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use doctoroncall::adapters::sanitize::SanitizingMakeWriter;
use doctoroncall::adapters::{LocalCredentialStore, SqliteStorage};
use doctoroncall::application::Services;
use doctoroncall::config::{load_token_seed, ServerConfig};
use doctoroncall::ports::Repositories;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging: stdout (so `docker logs` works) unless file mode
    // is requested.
    let use_file = std::env::var("DOCTORONCALL_LOG_MODE").is_ok_and(|mode| mode == "file");

    let (writer, _guard) = if use_file {
        let log_file = std::env::var("DOCTORONCALL_LOG_FILE")
            .unwrap_or_else(|_| "/app/data/doctoroncall.log".to_string());

        tracing_appender::non_blocking(open_log_file(Path::new(&log_file))?)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting DoctorOnCall...");

    let config = ServerConfig::from_env().context("invalid configuration")?;
    let seed = load_token_seed().context("failed to load token signing seed")?;
    tracing::info!("Token signing key {}", seed.fingerprint());
    let credentials = LocalCredentialStore::new(&seed, config.password_cost, config.token_ttl)
        .context("failed to initialize credential store")?;
    drop(seed);

    let storage = SqliteStorage::new(&config.database_path).with_context(|| {
        format!("failed to open database {}", config.database_path.display())
    })?;
    tracing::info!("Database ready at {}", config.database_path.display());

    let services = Services::new(
        Repositories::from_store(Arc::new(storage)),
        Arc::new(credentials),
    );
    let app = doctoroncall::api::router(services);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("DoctorOnCall shutdown complete.");
    Ok(())
}

/// Open `path` for appending, creating its directory first.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }

    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
