//! Analytics Aggregator
//!
//! Windowed, read-only queries over `visitor_events`. Every query is a pure
//! read; a failure is logged and answered with the empty/default result so the
//! dashboard keeps rendering while the generator is busy writing.

use chrono::{DateTime, Duration, Utc};
use persona_common::db::models::VisitorEvent;
use persona_common::db::{decode_event_row, EVENT_COLUMNS};
use persona_common::time::{
    from_epoch_millis, to_epoch_millis, to_epoch_millis_ceil, Clock, SystemClock,
};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use tracing::{debug, warn};

/// Placeholder for modes over an empty window
pub const NOT_AVAILABLE: &str = "N/A";

const HOUR_MS: i64 = 3_600_000;

/// Lookback window
///
/// `last_hours` ends at the aggregator clock's "now"; `ending_at` pins the end.
/// Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    hours: u32,
    end: Option<DateTime<Utc>>,
}

impl Window {
    pub fn last_hours(hours: u32) -> Self {
        Self { hours, end: None }
    }

    pub fn ending_at(end: DateTime<Utc>, hours: u32) -> Self {
        Self {
            hours,
            end: Some(end),
        }
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    /// `(start_ms, end_ms)` for the given "now"
    ///
    /// The end rounds up like stored write times, so an event appended in the
    /// current millisecond is inside a window ending now.
    fn bounds(&self, now: DateTime<Utc>) -> (i64, i64) {
        let end = self.end.unwrap_or(now);
        let start = end - Duration::hours(i64::from(self.hours));
        (to_epoch_millis(start), to_epoch_millis_ceil(end))
    }
}

/// Headline numbers for a window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_events: i64,
    /// Distinct clock hours with at least one event
    pub active_hours: i64,
    pub mean_tokens: f64,
    pub top_category: String,
    pub top_style: String,
    pub top_trait: String,
    pub distinct_categories: i64,
    pub degraded_events: i64,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            total_events: 0,
            active_hours: 0,
            mean_tokens: 0.0,
            top_category: NOT_AVAILABLE.to_string(),
            top_style: NOT_AVAILABLE.to_string(),
            top_trait: NOT_AVAILABLE.to_string(),
            distinct_categories: 0,
            degraded_events: 0,
        }
    }
}

/// One non-empty trend bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub bucket_start: DateTime<Utc>,
    pub event_count: i64,
    pub distinct_style_count: i64,
    pub mean_tokens: f64,
}

/// A category's share of the window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub count: i64,
    /// Percent of the window total, one decimal place
    pub percentage: f64,
}

/// Columns a mode can be computed over
#[derive(Debug, Clone, Copy)]
enum ModeColumn {
    Category,
    Style,
    Trait,
}

impl ModeColumn {
    fn column(&self) -> &'static str {
        match self {
            ModeColumn::Category => "category",
            ModeColumn::Style => "style_label",
            ModeColumn::Trait => "trait_label",
        }
    }
}

/// Read-only query front end for the dashboard
#[derive(Debug, Clone)]
pub struct Aggregator {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl Aggregator {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Count, activity, token mean, modes and category spread
    pub async fn summary(&self, window: Window) -> Summary {
        let (start, end) = window.bounds(self.clock.now());
        match self.try_summary(start, end).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(query = "summary", error = %e, "Analytics query failed");
                Summary::default()
            }
        }
    }

    async fn try_summary(&self, start: i64, end: i64) -> Result<Summary, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total_events,
                   COUNT(DISTINCT timestamp_ms / ?) AS active_hours,
                   COALESCE(AVG(tokens_used), 0.0) AS mean_tokens,
                   COUNT(DISTINCT category) AS distinct_categories,
                   COALESCE(SUM(degraded), 0) AS degraded_events
            FROM visitor_events
            WHERE timestamp_ms >= ? AND timestamp_ms <= ?
            "#,
        )
        .bind(HOUR_MS)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        let total_events: i64 = row.try_get("total_events")?;
        if total_events == 0 {
            return Ok(Summary::default());
        }

        Ok(Summary {
            total_events,
            active_hours: row.try_get("active_hours")?,
            mean_tokens: row.try_get("mean_tokens")?,
            top_category: self.mode(ModeColumn::Category, start, end).await?,
            top_style: self.mode(ModeColumn::Style, start, end).await?,
            top_trait: self.mode(ModeColumn::Trait, start, end).await?,
            distinct_categories: row.try_get("distinct_categories")?,
            degraded_events: row.try_get("degraded_events")?,
        })
    }

    /// Most frequent value; ties go to the lexicographically smallest
    async fn mode(&self, column: ModeColumn, start: i64, end: i64) -> Result<String, sqlx::Error> {
        let sql = format!(
            "SELECT {col} AS value, COUNT(*) AS n FROM visitor_events \
             WHERE timestamp_ms >= ? AND timestamp_ms <= ? \
             GROUP BY {col} ORDER BY n DESC, value ASC LIMIT 1",
            col = column.column()
        );
        let value: Option<String> = sqlx::query_scalar(&sql)
            .bind(start)
            .bind(end)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value.unwrap_or_else(|| NOT_AVAILABLE.to_string()))
    }

    /// Non-empty epoch-aligned buckets, newest first
    pub async fn trend(&self, window: Window, bucket: Duration) -> Vec<TrendPoint> {
        let bucket_ms = bucket.num_milliseconds();
        if bucket_ms <= 0 {
            warn!(bucket_ms, "Trend bucket must be positive");
            return Vec::new();
        }

        let (start, end) = window.bounds(self.clock.now());
        match self.try_trend(start, end, bucket_ms).await {
            Ok(points) => points,
            Err(e) => {
                warn!(query = "trend", error = %e, "Analytics query failed");
                Vec::new()
            }
        }
    }

    async fn try_trend(
        &self,
        start: i64,
        end: i64,
        bucket_ms: i64,
    ) -> Result<Vec<TrendPoint>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT (timestamp_ms / ?) * ? AS bucket_start,
                   COUNT(*) AS event_count,
                   COUNT(DISTINCT style_label) AS distinct_style_count,
                   AVG(tokens_used) AS mean_tokens
            FROM visitor_events
            WHERE timestamp_ms >= ? AND timestamp_ms <= ?
            GROUP BY bucket_start
            ORDER BY bucket_start DESC
            "#,
        )
        .bind(bucket_ms)
        .bind(bucket_ms)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(TrendPoint {
                    bucket_start: from_epoch_millis(row.try_get("bucket_start")?),
                    event_count: row.try_get("event_count")?,
                    distinct_style_count: row.try_get("distinct_style_count")?,
                    mean_tokens: row.try_get("mean_tokens")?,
                })
            })
            .collect()
    }

    /// Category shares of the window, largest first
    pub async fn distribution(&self, window: Window) -> Vec<CategoryShare> {
        let (start, end) = window.bounds(self.clock.now());
        match self.try_distribution(start, end).await {
            Ok(shares) => shares,
            Err(e) => {
                warn!(query = "distribution", error = %e, "Analytics query failed");
                Vec::new()
            }
        }
    }

    async fn try_distribution(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<CategoryShare>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT category, COUNT(*) AS count
            FROM visitor_events
            WHERE timestamp_ms >= ? AND timestamp_ms <= ?
            GROUP BY category
            ORDER BY count DESC, category ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let counts = rows
            .iter()
            .map(|row| {
                Ok((
                    row.try_get::<String, _>("category")?,
                    row.try_get::<i64, _>("count")?,
                ))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        let total: i64 = counts.iter().map(|(_, count)| count).sum();
        Ok(counts
            .into_iter()
            .map(|(category, count)| CategoryShare {
                category,
                count,
                percentage: percentage(count, total),
            })
            .collect())
    }

    /// The `limit` latest events across all time, newest first
    pub async fn recent(&self, limit: u32) -> Vec<VisitorEvent> {
        let sql = format!(
            "SELECT {} FROM visitor_events ORDER BY timestamp_ms DESC, event_id DESC LIMIT ?",
            EVENT_COLUMNS
        );
        let rows = match sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(query = "recent", error = %e, "Analytics query failed");
                return Vec::new();
            }
        };

        let events: Vec<VisitorEvent> = rows
            .iter()
            .filter_map(|row| match decode_event_row(row) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable visitor event");
                    None
                }
            })
            .collect();

        debug!(requested = limit, returned = events.len(), "Recent activity loaded");
        events
    }
}

/// `count / total` as a percentage rounded to one decimal
fn percentage(count: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}
