//! Test Helper Utilities
//!
//! Event fixtures appended at controlled instants through a shared manual
//! clock.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use persona_common::db::models::{
    AnalysisMetadata, CategorySource, ContextData, FallbackRecord, NewVisitorEvent, Stage,
};
use persona_common::db::{init_memory_database, EventStore};
use persona_common::time::ManualClock;
use persona_common::{StyleLabel, TraitLabel};
use persona_dash::analytics::Aggregator;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// 2025-06-01 10:00:00 UTC
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
}

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
}

pub fn event(
    name: &str,
    category: &str,
    style: StyleLabel,
    trait_: TraitLabel,
    tokens: u32,
) -> NewVisitorEvent {
    NewVisitorEvent {
        visit_id: Uuid::new_v4(),
        identity_name: name.to_string(),
        capability_text: "Turns dashboards into decisions".to_string(),
        category: category.to_string(),
        style_label: style,
        trait_label: trait_,
        tokens_used: tokens,
        analysis_metadata: AnalysisMetadata {
            degraded: false,
            provenance: "ai_service".to_string(),
            style_confidence: 0.8,
            trait_confidence: 0.7,
            fallbacks: Vec::new(),
            category_source: CategorySource::Matched,
            model: "mixtral-8x7b".to_string(),
        },
        context_data: ContextData::from_pairs([("booth", "accenture")]),
    }
}

/// Same event marked as having fallen back at name generation
pub fn degraded(mut event: NewVisitorEvent) -> NewVisitorEvent {
    event.analysis_metadata.degraded = true;
    event.analysis_metadata.fallbacks.push(FallbackRecord {
        stage: Stage::IdentityName,
        reason: "service unavailable".to_string(),
    });
    event
}

/// Store and aggregator sharing one database and one clock
pub struct Fixture {
    pub pool: SqlitePool,
    pub clock: ManualClock,
    pub store: EventStore,
    pub aggregator: Aggregator,
}

impl Fixture {
    pub async fn new() -> Self {
        let pool = init_memory_database().await.unwrap();
        let clock = ManualClock::new(base_time());
        Self {
            store: EventStore::with_clock(pool.clone(), Arc::new(clock.clone())),
            aggregator: Aggregator::with_clock(pool.clone(), Arc::new(clock.clone())),
            pool,
            clock,
        }
    }

    /// Append in chronological order; the store never moves time backwards
    pub async fn append_at(&self, instant: DateTime<Utc>, event: NewVisitorEvent) {
        self.clock.set(instant);
        self.store.append(&event).await.unwrap();
    }

    /// Five events across the 10:00 and 11:00 buckets, clock left at 12:00
    ///
    /// | time  | category        | style        | trait      | tokens |
    /// |-------|-----------------|--------------|------------|--------|
    /// | 10:05 | Data Wizard     | technical    | analytical | 100    |
    /// | 10:20 | Cloud Commander | professional | confident  | 100    |
    /// | 10:50 | AI Pioneer      | creative     | innovative | 100    |
    /// | 11:10 | Data Wizard     | technical    | analytical | 200    |
    /// | 11:40 | Cloud Commander | technical    | confident  | 200    |
    pub async fn seed_two_hours(&self) {
        use StyleLabel::*;
        use TraitLabel::*;

        self.append_at(at(10, 5), event("Query Quantum", "Data Wizard", Technical, Analytical, 100))
            .await;
        self.append_at(
            at(10, 20),
            event("Elastic Emperor", "Cloud Commander", Professional, Confident, 100),
        )
        .await;
        self.append_at(
            at(10, 50),
            degraded(event("Neural Navigator", "AI Pioneer", Creative, Innovative, 100)),
        )
        .await;
        self.append_at(at(11, 10), event("Schema Sage", "Data Wizard", Technical, Analytical, 200))
            .await;
        self.append_at(
            at(11, 40),
            event("Scale Sovereign", "Cloud Commander", Technical, Confident, 200),
        )
        .await;
        self.clock.set(at(12, 0));
    }
}
