//! Category reference data
//!
//! Seeded once at initialization; read-only for the matcher and the
//! aggregator afterwards.

use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::db::models::CategoryRecord;
use crate::Result;

/// Built-in category set written on first run
pub fn default_categories() -> Vec<CategoryRecord> {
    fn record(
        id: &str,
        name: &str,
        description: &str,
        traits: &[&str],
        names: &[&str],
        capabilities: &[&str],
    ) -> CategoryRecord {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        CategoryRecord {
            category_id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            traits_vector: owned(traits),
            sample_names: owned(names),
            sample_capabilities: owned(capabilities),
        }
    }

    vec![
        record(
            "wizard",
            "Data Wizard",
            "Analytical and transformative",
            &["analytical", "precise", "transformative"],
            &["The Schema Sage", "Query Quantum", "The Data Whisperer"],
            &[
                "Transforms messy data with a glance",
                "Processes petabytes in milliseconds",
            ],
        ),
        record(
            "commander",
            "Cloud Commander",
            "Leadership and scalable",
            &["leadership", "scalable", "reliable"],
            &["Elastico", "The Scale Master", "Cloud Conductor"],
            &[
                "Scales infinitely without breaking a sweat",
                "Commands any cloud workload",
            ],
        ),
        record(
            "oracle",
            "AI Oracle",
            "Predictive and insightful",
            &["predictive", "insightful", "forward-thinking"],
            &["Cortex Commander", "ML Maverick", "The Algorithm Alchemist"],
            &[
                "Predicts future trends with 99.9% accuracy",
                "Builds ML models at the speed of thought",
            ],
        ),
        record(
            "ninja",
            "Query Ninja",
            "Fast and efficient",
            &["fast", "efficient", "problem-solving"],
            &["Zero-Copy Captain", "Compute Optimizer", "The Concurrency Guardian"],
            &[
                "Optimizes any query instantly",
                "Handles massive concurrency effortlessly",
            ],
        ),
    ]
}

/// Seed the built-in categories if the table is empty
///
/// Returns the number of records written (0 when already seeded).
pub async fn seed_categories(pool: &SqlitePool) -> Result<usize> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(pool)
        .await?;

    if existing > 0 {
        debug!(existing, "Category table already seeded");
        return Ok(0);
    }

    let records = default_categories();
    let mut tx = pool.begin().await?;
    for record in &records {
        insert_category_with(&mut *tx, record).await?;
    }
    tx.commit().await?;

    Ok(records.len())
}

/// Insert a single category record
pub async fn insert_category(pool: &SqlitePool, record: &CategoryRecord) -> Result<()> {
    let mut conn = pool.acquire().await?;
    insert_category_with(&mut *conn, record).await
}

async fn insert_category_with(
    conn: &mut sqlx::SqliteConnection,
    record: &CategoryRecord,
) -> Result<()> {
    let traits = serde_json::to_string(&record.traits_vector)?;
    let names = serde_json::to_string(&record.sample_names)?;
    let capabilities = serde_json::to_string(&record.sample_capabilities)?;

    sqlx::query(
        r#"
        INSERT INTO categories (
            category_id, name, description, traits_vector, sample_names, sample_capabilities
        ) VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.category_id)
    .bind(&record.name)
    .bind(&record.description)
    .bind(traits)
    .bind(names)
    .bind(capabilities)
    .execute(conn)
    .await?;

    Ok(())
}

/// All stored categories, ordered by id
pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<CategoryRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT category_id, name, description, traits_vector, sample_names, sample_capabilities
        FROM categories
        ORDER BY category_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<CategoryRecord> {
            let traits: String = row.try_get("traits_vector")?;
            let names: String = row.try_get("sample_names")?;
            let capabilities: String = row.try_get("sample_capabilities")?;
            Ok(CategoryRecord {
                category_id: row.try_get("category_id")?,
                name: row.try_get("name")?,
                description: row.try_get("description")?,
                traits_vector: serde_json::from_str(&traits)?,
                sample_names: serde_json::from_str(&names)?,
                sample_capabilities: serde_json::from_str(&capabilities)?,
            })
        })
        .collect()
}
