//! Append-only visitor event log
//!
//! There are no update or delete operations. Each append is a single INSERT,
//! so concurrent visitor sessions need no coordination beyond SQLite's own
//! write serialization.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::db::models::{NewVisitorEvent, VisitorEvent};
use crate::labels::Label;
use crate::time::{from_epoch_millis, to_epoch_millis_ceil, Clock, SystemClock};
use crate::{Error, Result};

/// Column list shared by every reader of `visitor_events`
pub const EVENT_COLUMNS: &str = "visit_id, timestamp_ms, identity_name, capability_text, category, \
     style_label, trait_label, tokens_used, analysis_metadata, context_data";

/// Event Store backed by the `visitor_events` table
#[derive(Debug, Clone)]
pub struct EventStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl EventStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Append one event and return its visit id
    ///
    /// The timestamp is `max(now, latest stored timestamp)`, computed inside
    /// the INSERT so the column never decreases. `now` is rounded up to the
    /// next millisecond so the stored time is never before the call.
    pub async fn append(&self, event: &NewVisitorEvent) -> Result<Uuid> {
        event.validate()?;

        let now_ms = to_epoch_millis_ceil(self.clock.now());
        let metadata = serde_json::to_string(&event.analysis_metadata)?;
        let context = serde_json::to_string(&event.context_data)?;

        let result = sqlx::query(
            r#"
            INSERT INTO visitor_events (
                visit_id, timestamp_ms, identity_name, capability_text, category,
                style_label, trait_label, tokens_used, degraded,
                analysis_metadata, context_data
            )
            SELECT ?, MAX(?, COALESCE((SELECT MAX(timestamp_ms) FROM visitor_events), 0)),
                   ?, ?, ?, ?, ?, ?, ?, ?, ?
            "#,
        )
        .bind(event.visit_id.to_string())
        .bind(now_ms)
        .bind(&event.identity_name)
        .bind(&event.capability_text)
        .bind(&event.category)
        .bind(event.style_label.as_str())
        .bind(event.trait_label.as_str())
        .bind(i64::from(event.tokens_used))
        .bind(event.degraded())
        .bind(metadata)
        .bind(context)
        .execute(&self.pool)
        .await?;

        debug!(
            visit_id = %event.visit_id,
            event_id = result.last_insert_rowid(),
            degraded = event.degraded(),
            "Visitor event appended"
        );

        Ok(event.visit_id)
    }

    /// Number of stored events
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM visitor_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Decode a row selected with [`EVENT_COLUMNS`]
pub fn decode_event_row(row: &SqliteRow) -> Result<VisitorEvent> {
    let visit_id: String = row.try_get("visit_id")?;
    let visit_id = Uuid::parse_str(&visit_id)
        .map_err(|e| Error::Internal(format!("Invalid visit_id '{}': {}", visit_id, e)))?;

    let style: String = row.try_get("style_label")?;
    let trait_: String = row.try_get("trait_label")?;
    let tokens: i64 = row.try_get("tokens_used")?;
    let tokens_used = u32::try_from(tokens)
        .map_err(|_| Error::Internal(format!("tokens_used out of range: {}", tokens)))?;

    let metadata: String = row.try_get("analysis_metadata")?;
    let context: String = row.try_get("context_data")?;

    Ok(VisitorEvent {
        timestamp: from_epoch_millis(row.try_get("timestamp_ms")?),
        event: NewVisitorEvent {
            visit_id,
            identity_name: row.try_get("identity_name")?,
            capability_text: row.try_get("capability_text")?,
            category: row.try_get("category")?,
            style_label: style
                .parse()
                .map_err(|e: Error| Error::Internal(e.to_string()))?,
            trait_label: trait_
                .parse()
                .map_err(|e: Error| Error::Internal(e.to_string()))?,
            tokens_used,
            analysis_metadata: serde_json::from_str(&metadata)?,
            context_data: serde_json::from_str(&context)?,
        },
    })
}
