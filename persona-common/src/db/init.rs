//! Database initialization
//!
//! Creates the SQLite file on first run, applies connection pragmas and the
//! idempotent schema, then seeds the category reference table when empty.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Independent visitor sessions append concurrently
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets the dashboard read while the generator appends
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    let seeded = crate::db::categories::seed_categories(&pool).await?;
    if seeded > 0 {
        info!("Seeded {} category records", seeded);
    }

    Ok(pool)
}

/// In-memory database with the full schema and seed data
///
/// Single connection: every `sqlite::memory:` connection is its own database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = empty_memory_database().await?;
    crate::db::categories::seed_categories(&pool).await?;
    Ok(pool)
}

/// In-memory database with the schema but no category records
pub async fn empty_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_categories_table(pool).await?;
    create_visitor_events_table(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Category reference data; list columns hold JSON arrays
async fn create_categories_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            category_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            traits_vector TEXT NOT NULL DEFAULT '[]',
            sample_names TEXT NOT NULL DEFAULT '[]',
            sample_capabilities TEXT NOT NULL DEFAULT '[]'
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Append-only visitor event log
///
/// `event_id` preserves insertion order; `timestamp_ms` is assigned by the
/// store and never decreases.
async fn create_visitor_events_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS visitor_events (
            event_id INTEGER PRIMARY KEY AUTOINCREMENT,
            visit_id TEXT NOT NULL,
            timestamp_ms INTEGER NOT NULL,
            identity_name TEXT NOT NULL,
            capability_text TEXT NOT NULL,
            category TEXT NOT NULL,
            style_label TEXT NOT NULL,
            trait_label TEXT NOT NULL,
            tokens_used INTEGER NOT NULL DEFAULT 0 CHECK (tokens_used >= 0),
            degraded INTEGER NOT NULL DEFAULT 0,
            analysis_metadata TEXT NOT NULL,
            context_data TEXT NOT NULL DEFAULT '{}'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_visitor_events_timestamp ON visitor_events (timestamp_ms)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_visitor_events_visit ON visitor_events (visit_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
