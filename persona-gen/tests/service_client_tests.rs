//! HttpAiService against a local mock AI service

mod helpers;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use helpers::{default_pipeline_config, jpeg_image};
use persona_common::config::AiServiceConfig;
use persona_common::db::init_memory_database;
use persona_common::{LabelSet, SessionContext, StyleLabel, TraitLabel};
use persona_gen::services::{ClassificationService, GenerationService, HttpAiService, ServiceError};
use persona_gen::workflow::GenerationPipeline;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Serve `router` on an ephemeral port and return its base URL
async fn spawn_mock(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: &str, api_key: Option<&str>, timeout_ms: u64) -> HttpAiService {
    HttpAiService::new(&AiServiceConfig {
        base_url: base_url.to_string(),
        api_key: api_key.map(str::to_string),
        timeout_ms,
        ..AiServiceConfig::default()
    })
    .unwrap()
}

async fn classify_handler(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(
        headers.get("authorization").and_then(|v| v.to_str().ok()),
        Some("Bearer test-key")
    );
    assert!(body["image_base64"].as_str().is_some_and(|s| !s.is_empty()));

    let label = match body["label_set"].as_str() {
        Some("professional_style") => "Creative",
        Some("personality_trait") => "collaborative",
        other => panic!("unexpected label_set {:?}", other),
    };
    assert_eq!(body["labels"].as_array().map(Vec::len), Some(4));
    Json(json!({ "label": label, "confidence": 0.77 }))
}

async fn complete_handler(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body["model"], "mixtral-8x7b");
    let prompt = body["prompt"].as_str().unwrap_or_default();
    if prompt.contains("superpower") {
        assert_eq!(body["max_tokens"], 150);
        Json(json!({
            "text": "  Orchestrates teams across every cloud region ",
            "tokens_used": 61
        }))
    } else {
        assert_eq!(body["max_tokens"], 100);
        Json(json!({ "text": "\"The Harmony Engine\"", "tokens_used": 19 }))
    }
}

fn mock_ai_router() -> Router {
    Router::new()
        .route("/v1/classify", post(classify_handler))
        .route("/v1/complete", post(complete_handler))
}

#[tokio::test]
async fn test_classify_sends_contract_and_bearer_key() {
    let base_url = spawn_mock(mock_ai_router()).await;
    let client = client(&base_url, Some("test-key"), 2_000);

    let style = client.classify(&jpeg_image(), LabelSet::Style).await.unwrap();
    assert_eq!(style.label, "Creative");
    assert!((style.confidence - 0.77).abs() < 1e-9);
}

#[tokio::test]
async fn test_complete_returns_text_and_tokens() {
    let base_url = spawn_mock(mock_ai_router()).await;
    let client = client(&base_url, None, 2_000);

    let completion = client.complete("a superhero name please", 100).await.unwrap();
    assert_eq!(completion.text, "\"The Harmony Engine\"");
    assert_eq!(completion.tokens_used, 19);
}

#[tokio::test]
async fn test_non_success_status_is_api_error() {
    let router = Router::new().route(
        "/v1/complete",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
    );
    let base_url = spawn_mock(router).await;

    let result = client(&base_url, None, 2_000).complete("prompt", 100).await;
    match result {
        Err(ServiceError::Api(status, body)) => {
            assert_eq!(status, 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_contract_violation_is_malformed() {
    let router = Router::new().route(
        "/v1/classify",
        post(|| async { Json(json!({ "label": "casual", "confidence": "very" })) }),
    );
    let base_url = spawn_mock(router).await;

    let result = client(&base_url, None, 2_000)
        .classify(&jpeg_image(), LabelSet::Style)
        .await;
    assert!(matches!(result, Err(ServiceError::Malformed(_))));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let router = Router::new().route(
        "/v1/complete",
        post(|| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Json(json!({ "text": "too late", "tokens_used": 1 }))
        }),
    );
    let base_url = spawn_mock(router).await;

    let result = client(&base_url, None, 100).complete("prompt", 100).await;
    assert!(matches!(result, Err(ServiceError::Timeout(100))));
}

#[tokio::test]
async fn test_unreachable_service_is_unavailable() {
    // Grab a free port, then release it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = client(&format!("http://{}", addr), None, 2_000)
        .complete("prompt", 100)
        .await;
    assert!(matches!(result, Err(ServiceError::Unavailable(_))));
}

#[tokio::test]
async fn test_pipeline_over_http_is_live() {
    let base_url = spawn_mock(mock_ai_router()).await;
    let ai = Arc::new(client(&base_url, Some("test-key"), 2_000));
    let pool = init_memory_database().await.unwrap();
    let pipeline =
        GenerationPipeline::from_config(&default_pipeline_config(), ai.clone(), ai, pool);

    let session = SessionContext::visitor(Default::default());
    let event = pipeline
        .run(&jpeg_image(), &session, &mut StdRng::seed_from_u64(12))
        .await;

    assert!(!event.degraded(), "{:?}", event.analysis_metadata.fallbacks);
    assert_eq!(event.identity_name, "The Harmony Engine");
    assert_eq!(event.capability_text, "Orchestrates teams across every cloud region");
    assert_eq!(event.style_label, StyleLabel::Creative);
    assert_eq!(event.trait_label, TraitLabel::Collaborative);
    assert_eq!(event.tokens_used, 80);
    assert_eq!(event.analysis_metadata.model, "mixtral-8x7b");
}
