//! Database initialization against real files

use persona_common::db::init::{init_database, SCHEMA_VERSION};
use persona_common::db::{list_categories, EventStore};

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp = tempfile::tempdir().unwrap();
    let db_path = temp.path().join("data").join("persona.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing_without_reseeding() {
    let temp = tempfile::tempdir().unwrap();
    let db_path = temp.path().join("persona.db");

    let pool1 = init_database(&db_path).await.unwrap();
    assert_eq!(list_categories(&pool1).await.unwrap().len(), 4);
    pool1.close().await;

    let pool2 = init_database(&db_path).await.unwrap();
    assert_eq!(list_categories(&pool2).await.unwrap().len(), 4);

    let version: i64 = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(version, SCHEMA_VERSION);
}

#[tokio::test]
async fn test_wal_mode_enabled() {
    let temp = tempfile::tempdir().unwrap();
    let pool = init_database(&temp.path().join("persona.db")).await.unwrap();

    let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}

#[tokio::test]
async fn test_event_store_starts_empty() {
    let temp = tempfile::tempdir().unwrap();
    let pool = init_database(&temp.path().join("persona.db")).await.unwrap();

    let store = EventStore::new(pool);
    assert_eq!(store.count().await.unwrap(), 0);
}
