//! persona-dash - Analytics Dashboard
//!
//! Read-only analytics over the events written by persona-gen.
//!
//! - Default port: 5741
//! - Opens persona.db with `mode=ro`
//! - Staff password gate from `[dashboard].password`

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use persona_common::api::DashboardGate;
use persona_common::config::{locate_database_path, TomlConfig};
use persona_dash::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};

/// Command-line arguments for persona-dash
#[derive(Parser, Debug)]
#[command(name = "persona-dash")]
#[command(about = "Persona booth analytics dashboard")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "PERSONA_DASH_PORT")]
    port: Option<u16>,

    /// Root folder holding persona.db
    #[arg(short, long, env = "PERSONA_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = "PERSONA_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = TomlConfig::load_or_default(args.config.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.clone().into()),
        )
        .init();

    // Build identification first, before any database delay
    info!(
        "Starting persona-dash v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    // The reader never creates folders; a missing file is reported below
    let db_path = locate_database_path("persona-dash", args.root_folder.clone(), &toml_config);
    info!("Database path: {}", db_path.display());

    let pool = match persona_dash::db::connect_readonly(&db_path).await {
        Ok(pool) => {
            info!("Connected to database (read-only)");
            pool
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e);
        }
    };

    let dashboard = &toml_config.dashboard;
    let gate = DashboardGate::new(dashboard.password.as_deref());
    if gate.is_enabled() {
        info!("Dashboard password gate enabled");
    } else {
        info!("No dashboard password configured; analytics are open to anyone on the network");
    }
    if dashboard.host != "127.0.0.1" && !gate.is_enabled() {
        warn!(host = %dashboard.host, "Open dashboard bound beyond localhost");
    }

    let state = AppState::new(pool, gate, dashboard);
    let app = build_router(state);

    let port = args.port.unwrap_or(dashboard.port);
    let host: std::net::IpAddr = dashboard.host.parse().context("Invalid dashboard.host")?;
    let addr = SocketAddr::new(host, port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("persona-dash listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

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
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
