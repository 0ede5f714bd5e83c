//! persona-gen library interface
//!
//! Turns a visitor photo into a persona and records the interaction.
//! Exposes public APIs for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use persona_common::db::models::ContextData;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::workflow::GenerationPipeline;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Pipeline shared by every request; each run owns its own rng
    pub pipeline: Arc<GenerationPipeline>,
    /// Static tags for new visitor sessions
    pub context: ContextData,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, pipeline: GenerationPipeline, context: ContextData) -> Self {
        Self {
            db,
            pipeline: Arc::new(pipeline),
            context,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::generate_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
