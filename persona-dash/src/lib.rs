//! persona-dash library - Analytics dashboard
//!
//! Read-only windowed analytics over the visitor event log, behind the staff
//! password gate.

use axum::Router;
use chrono::{DateTime, Utc};
use persona_common::api::DashboardGate;
use persona_common::config::DashboardConfig;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod analytics;
pub mod api;
pub mod db;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

use crate::analytics::Aggregator;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (read-only)
    pub db: SqlitePool,
    pub aggregator: Aggregator,
    /// Staff password gate
    pub gate: DashboardGate,
    pub default_window_hours: u32,
    pub recent_limit: u32,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, gate: DashboardGate, config: &DashboardConfig) -> Self {
        Self::with_aggregator(Aggregator::new(db), gate, config)
    }

    /// State around a prepared aggregator (tests inject a manual clock)
    pub fn with_aggregator(
        aggregator: Aggregator,
        gate: DashboardGate,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            db: aggregator.pool().clone(),
            aggregator,
            gate,
            default_window_hours: config.default_window_hours,
            recent_limit: config.recent_limit,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Analytics routes sit behind the password gate; `/health` is public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    let protected = api::analytics_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        api::auth_middleware,
    ));

    Router::new()
        .merge(protected)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
