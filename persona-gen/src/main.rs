//! persona-gen - Persona Generation Service
//!
//! **Module Identity:**
//! - Name: persona-gen (Generation)
//! - Default port: 5740
//!
//! Accepts visitor photos, runs the classification/generation pipeline and
//! appends one event per visitor to the shared database.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use persona_common::config::{resolve_database_path, TomlConfig};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use persona_gen::config::PipelineConfig;
use persona_gen::services::HttpAiService;
use persona_gen::workflow::GenerationPipeline;
use persona_gen::AppState;

/// Command-line arguments for persona-gen
#[derive(Parser, Debug)]
#[command(name = "persona-gen")]
#[command(about = "Persona generation service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "PERSONA_GEN_PORT")]
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

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{},tower_http=info", toml_config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting persona-gen v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    // Step 1: Locate (and if needed create) the database
    let db_path = resolve_database_path("persona-gen", args.root_folder.clone(), &toml_config)
        .context("Failed to resolve database path")?;
    info!("Database: {}", db_path.display());

    let db_pool = persona_common::db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("Database connection established");

    // Step 2: Build the pipeline
    let pipeline_config =
        PipelineConfig::from_toml(&toml_config).context("Invalid generator configuration")?;
    let ai_service = Arc::new(
        HttpAiService::new(&pipeline_config.ai_service).context("Failed to create AI client")?,
    );
    info!(
        "AI service: {} (model {}, timeout {} ms)",
        ai_service.base_url(),
        pipeline_config.ai_service.model,
        pipeline_config.ai_service.timeout_ms
    );

    let pipeline = GenerationPipeline::from_config(
        &pipeline_config,
        ai_service.clone(),
        ai_service,
        db_pool.clone(),
    );
    let state = AppState::new(db_pool, pipeline, pipeline_config.context.clone());
    let app = persona_gen::build_router(state);

    // Step 3: Serve
    let port = args.port.unwrap_or(toml_config.generator.port);
    let host: std::net::IpAddr = toml_config
        .generator
        .host
        .parse()
        .context("Invalid generator.host")?;
    let addr = SocketAddr::new(host, port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

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
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
