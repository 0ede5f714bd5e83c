//! Aggregator queries over seeded event logs

mod helpers;

use chrono::Duration;
use helpers::{at, event, Fixture};
use persona_common::db::init_database;
use persona_common::db::EventStore;
use persona_common::{StyleLabel, TraitLabel};
use persona_dash::analytics::{Aggregator, Window, NOT_AVAILABLE};

#[tokio::test]
async fn test_summary_of_empty_log() {
    let fixture = Fixture::new().await;

    let summary = fixture.aggregator.summary(Window::last_hours(24)).await;

    assert_eq!(summary.total_events, 0);
    assert_eq!(summary.active_hours, 0);
    assert_eq!(summary.mean_tokens, 0.0);
    assert_eq!(summary.top_category, NOT_AVAILABLE);
    assert_eq!(summary.top_style, NOT_AVAILABLE);
    assert_eq!(summary.top_trait, NOT_AVAILABLE);
    assert_eq!(summary.distinct_categories, 0);
}

#[tokio::test]
async fn test_summary_counts_and_modes() {
    let fixture = Fixture::new().await;
    fixture.seed_two_hours().await;

    let summary = fixture.aggregator.summary(Window::last_hours(24)).await;

    assert_eq!(summary.total_events, 5);
    assert_eq!(summary.active_hours, 2);
    assert!((summary.mean_tokens - 140.0).abs() < 1e-9);
    // Data Wizard and Cloud Commander tie at two each
    assert_eq!(summary.top_category, "Cloud Commander");
    assert_eq!(summary.top_style, "technical");
    // analytical and confident tie at two each
    assert_eq!(summary.top_trait, "analytical");
    assert_eq!(summary.distinct_categories, 3);
    assert_eq!(summary.degraded_events, 1);
}

#[tokio::test]
async fn test_trend_two_hour_buckets_newest_first() {
    let fixture = Fixture::new().await;
    fixture.seed_two_hours().await;

    let trend = fixture
        .aggregator
        .trend(Window::last_hours(24), Duration::hours(1))
        .await;

    assert_eq!(trend.len(), 2);
    assert_eq!(trend.iter().map(|p| p.event_count).sum::<i64>(), 5);

    assert_eq!(trend[0].bucket_start, at(11, 0));
    assert_eq!(trend[0].event_count, 2);
    assert_eq!(trend[0].distinct_style_count, 1);
    assert!((trend[0].mean_tokens - 200.0).abs() < 1e-9);

    assert_eq!(trend[1].bucket_start, at(10, 0));
    assert_eq!(trend[1].event_count, 3);
    assert_eq!(trend[1].distinct_style_count, 3);
    assert!((trend[1].mean_tokens - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_trend_skips_empty_buckets() {
    let fixture = Fixture::new().await;
    fixture.seed_two_hours().await;

    let trend = fixture
        .aggregator
        .trend(Window::last_hours(24), Duration::minutes(30))
        .await;

    let starts: Vec<_> = trend.iter().map(|p| p.bucket_start).collect();
    assert_eq!(starts, vec![at(11, 30), at(11, 0), at(10, 30), at(10, 0)]);
    assert!(trend.iter().all(|p| p.event_count > 0));
}

#[tokio::test]
async fn test_trend_rejects_empty_bucket_width() {
    let fixture = Fixture::new().await;
    fixture.seed_two_hours().await;

    let trend = fixture
        .aggregator
        .trend(Window::last_hours(24), Duration::zero())
        .await;
    assert!(trend.is_empty());
}

#[tokio::test]
async fn test_distribution_percentages() {
    let fixture = Fixture::new().await;
    fixture.seed_two_hours().await;

    let shares = fixture.aggregator.distribution(Window::last_hours(24)).await;

    let names: Vec<&str> = shares.iter().map(|s| s.category.as_str()).collect();
    assert_eq!(names, vec!["Cloud Commander", "Data Wizard", "AI Pioneer"]);
    assert_eq!(shares[0].count, 2);
    assert_eq!(shares[0].percentage, 40.0);
    assert_eq!(shares[2].percentage, 20.0);

    let total: f64 = shares.iter().map(|s| s.percentage).sum();
    assert!((total - 100.0).abs() < 0.2, "total {}", total);
}

#[tokio::test]
async fn test_distribution_rounding_thirds() {
    use StyleLabel::Casual;
    use TraitLabel::Collaborative;

    let fixture = Fixture::new().await;
    for (minute, category) in [(1, "A"), (2, "B"), (3, "C")] {
        fixture
            .append_at(at(10, minute), event("x", category, Casual, Collaborative, 10))
            .await;
    }
    fixture.clock.set(at(12, 0));

    let shares = fixture.aggregator.distribution(Window::last_hours(24)).await;
    assert!(shares.iter().all(|s| s.percentage == 33.3));
}

#[tokio::test]
async fn test_window_excludes_older_events() {
    use StyleLabel::Casual;
    use TraitLabel::Collaborative;

    let fixture = Fixture::new().await;
    fixture
        .append_at(
            at(10, 0) - Duration::hours(30),
            event("old", "Old Guard", Casual, Collaborative, 50),
        )
        .await;
    fixture.seed_two_hours().await;

    let summary = fixture.aggregator.summary(Window::last_hours(24)).await;
    assert_eq!(summary.total_events, 5);

    let shares = fixture.aggregator.distribution(Window::last_hours(24)).await;
    assert!(shares.iter().all(|s| s.category != "Old Guard"));

    // Wider window picks it up
    let summary = fixture.aggregator.summary(Window::last_hours(48)).await;
    assert_eq!(summary.total_events, 6);

    // recent() ignores the window
    let recent = fixture.aggregator.recent(10).await;
    assert_eq!(recent.len(), 6);
}

#[tokio::test]
async fn test_window_ending_at_explicit_instant() {
    let fixture = Fixture::new().await;
    fixture.seed_two_hours().await;

    // 10:00..=11:00 holds the three 10:xx events
    let summary = fixture.aggregator.summary(Window::ending_at(at(11, 0), 1)).await;
    assert_eq!(summary.total_events, 3);
    assert_eq!(summary.active_hours, 1);
}

#[tokio::test]
async fn test_recent_returns_newest_first() {
    use StyleLabel::Professional;
    use TraitLabel::Confident;

    let fixture = Fixture::new().await;
    for i in 0..10 {
        let name = format!("visitor-{}", i);
        fixture
            .append_at(at(10, i), event(&name, "Cloud Commander", Professional, Confident, 10))
            .await;
    }

    let recent = fixture.aggregator.recent(3).await;

    let names: Vec<&str> = recent.iter().map(|e| e.event.identity_name.as_str()).collect();
    assert_eq!(names, vec!["visitor-9", "visitor-8", "visitor-7"]);
    assert_eq!(recent[0].timestamp, at(10, 9));
}

#[tokio::test]
async fn test_recent_breaks_timestamp_ties_by_insertion() {
    use StyleLabel::Professional;
    use TraitLabel::Confident;

    let fixture = Fixture::new().await;
    for name in ["first", "second", "third"] {
        fixture
            .append_at(at(10, 0), event(name, "Cloud Commander", Professional, Confident, 10))
            .await;
    }

    let recent = fixture.aggregator.recent(10).await;

    let names: Vec<&str> = recent.iter().map(|e| e.event.identity_name.as_str()).collect();
    assert_eq!(names, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn test_query_failure_yields_empty_results() {
    let fixture = Fixture::new().await;
    fixture.seed_two_hours().await;
    fixture.pool.close().await;

    let aggregator = &fixture.aggregator;
    let window = Window::last_hours(24);

    let summary = aggregator.summary(window).await;
    assert_eq!(summary.total_events, 0);
    assert_eq!(summary.top_category, NOT_AVAILABLE);
    assert!(aggregator.trend(window, Duration::hours(1)).await.is_empty());
    assert!(aggregator.distribution(window).await.is_empty());
    assert!(aggregator.recent(5).await.is_empty());
}

#[tokio::test]
async fn test_readonly_connection_sees_later_appends() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("persona.db");
    let writer = init_database(&db_path).await.unwrap();
    let reader = persona_dash::db::connect_readonly(&db_path).await.unwrap();
    let aggregator = Aggregator::new(reader);

    assert!(aggregator.recent(1).await.is_empty());

    let candidate = event(
        "Pipeline Paladin",
        "Data Wizard",
        StyleLabel::Technical,
        TraitLabel::Innovative,
        42,
    );
    EventStore::new(writer.clone()).append(&candidate).await.unwrap();

    let recent = aggregator.recent(1).await;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].event, candidate);

    let summary = aggregator.summary(Window::last_hours(1)).await;
    assert_eq!(summary.total_events, 1);

    writer.close().await;
}
