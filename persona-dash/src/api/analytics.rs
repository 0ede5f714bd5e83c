//! Analytics query API
//!
//! `GET /api/analytics` returns every view at once; the sub-routes return one
//! view each. All accept `hours`; `trend` also reads `bucket_minutes` and
//! `recent` reads `limit`.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::Duration;
use persona_common::db::models::VisitorEvent;
use persona_common::SessionContext;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analytics::{CategoryShare, Summary, TrendPoint, Window};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Longest accepted lookback (one year)
pub const MAX_WINDOW_HOURS: u32 = 24 * 365;
/// Widest accepted trend bucket (one week)
pub const MAX_BUCKET_MINUTES: u32 = 7 * 24 * 60;
/// Largest recent-activity page
pub const MAX_RECENT_LIMIT: u32 = 100;

const DEFAULT_BUCKET_MINUTES: u32 = 60;

/// Query parameters shared by every analytics route
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    /// Lookback window; defaults to `dashboard.default_window_hours`
    pub hours: Option<u32>,
    /// Trend bucket width
    pub bucket_minutes: Option<u32>,
    /// Recent-activity size; defaults to `dashboard.recent_limit`
    pub limit: Option<u32>,
}

impl AnalyticsQuery {
    fn window(&self, state: &AppState) -> ApiResult<Window> {
        let hours = self.hours.unwrap_or(state.default_window_hours);
        if hours == 0 || hours > MAX_WINDOW_HOURS {
            return Err(ApiError::BadRequest(format!(
                "hours must be between 1 and {}",
                MAX_WINDOW_HOURS
            )));
        }
        Ok(Window::last_hours(hours))
    }

    fn bucket(&self) -> ApiResult<Duration> {
        let minutes = self.bucket_minutes.unwrap_or(DEFAULT_BUCKET_MINUTES);
        if minutes == 0 || minutes > MAX_BUCKET_MINUTES {
            return Err(ApiError::BadRequest(format!(
                "bucket_minutes must be between 1 and {}",
                MAX_BUCKET_MINUTES
            )));
        }
        Ok(Duration::minutes(i64::from(minutes)))
    }

    fn limit(&self, state: &AppState) -> ApiResult<u32> {
        let limit = self.limit.unwrap_or(state.recent_limit);
        if limit == 0 || limit > MAX_RECENT_LIMIT {
            return Err(ApiError::BadRequest(format!(
                "limit must be between 1 and {}",
                MAX_RECENT_LIMIT
            )));
        }
        Ok(limit)
    }
}

/// Combined dashboard payload
#[derive(Debug, Serialize)]
pub struct AnalyticsReport {
    pub window_hours: u32,
    pub summary: Summary,
    pub trend: Vec<TrendPoint>,
    pub distribution: Vec<CategoryShare>,
    pub recent: Vec<VisitorEvent>,
}

/// GET /api/analytics
pub async fn get_report(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> ApiResult<Json<AnalyticsReport>> {
    let Query(query) = query?;
    let window = query.window(&state)?;
    let bucket = query.bucket()?;
    let limit = query.limit(&state)?;
    debug!(session = %session.visit_id(), hours = window.hours(), "Analytics report requested");

    let aggregator = &state.aggregator;
    let (summary, trend, distribution, recent) = tokio::join!(
        aggregator.summary(window),
        aggregator.trend(window, bucket),
        aggregator.distribution(window),
        aggregator.recent(limit),
    );

    Ok(Json(AnalyticsReport {
        window_hours: window.hours(),
        summary,
        trend,
        distribution,
        recent,
    }))
}

/// GET /api/analytics/summary
pub async fn get_summary(
    State(state): State<AppState>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> ApiResult<Json<Summary>> {
    let Query(query) = query?;
    let window = query.window(&state)?;
    Ok(Json(state.aggregator.summary(window).await))
}

/// GET /api/analytics/trend
pub async fn get_trend(
    State(state): State<AppState>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TrendPoint>>> {
    let Query(query) = query?;
    let window = query.window(&state)?;
    let bucket = query.bucket()?;
    Ok(Json(state.aggregator.trend(window, bucket).await))
}

/// GET /api/analytics/distribution
pub async fn get_distribution(
    State(state): State<AppState>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<CategoryShare>>> {
    let Query(query) = query?;
    let window = query.window(&state)?;
    Ok(Json(state.aggregator.distribution(window).await))
}

/// GET /api/analytics/recent
pub async fn get_recent(
    State(state): State<AppState>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<VisitorEvent>>> {
    let Query(query) = query?;
    let limit = query.limit(&state)?;
    Ok(Json(state.aggregator.recent(limit).await))
}

/// Build analytics routes (caller adds the auth layer)
pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/api/analytics", get(get_report))
        .route("/api/analytics/summary", get(get_summary))
        .route("/api/analytics/trend", get(get_trend))
        .route("/api/analytics/distribution", get(get_distribution))
        .route("/api/analytics/recent", get(get_recent))
}
