//! Identity reconciliation service (idlink-svc) - Main entry point
//!
//! Hosts the `/identify` endpoint: each request carries a partial contact
//! observation and receives the resolved identity cluster's projection.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use idlink_svc::api;

/// Command-line arguments for idlink-svc
#[derive(Parser, Debug)]
#[command(name = "idlink-svc")]
#[command(about = "Contact identity reconciliation service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5760", env = "IDLINK_PORT")]
    port: u16,

    /// Path to the SQLite database file
    #[arg(short, long)]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "idlink_svc=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    let db_path =
        idlink_common::config::resolve_database_path(args.database.as_deref(), "IDLINK_DATABASE")
            .context("Failed to resolve database path")?;

    info!("Starting idlink identity service on port {}", args.port);
    info!("Database: {}", db_path.display());

    let db = idlink_common::db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let app_state = api::AppState {
        db,
        database_path: db_path.to_string_lossy().to_string(),
        port: args.port,
    };

    let app = api::create_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
