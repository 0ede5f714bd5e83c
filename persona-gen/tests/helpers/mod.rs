//! Test Helper Utilities
//!
//! Scriptable AI service doubles and pipeline wiring shared by the
//! integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use persona_common::config::TomlConfig;
use persona_common::LabelSet;
use persona_gen::config::PipelineConfig;
use persona_gen::models::ImagePayload;
use persona_gen::services::{
    ClassificationService, Completion, GenerationService, RawClassification, ServiceError,
};
use persona_gen::workflow::GenerationPipeline;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Minimal JPEG (SOI + JFIF APP0 marker)
pub const JPEG_BYTES: [u8; 12] = [
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01,
];

pub fn jpeg_image() -> ImagePayload {
    ImagePayload::from_bytes(&JPEG_BYTES).unwrap()
}

pub fn jpeg_base64() -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(JPEG_BYTES)
}

pub const NAME_TOKENS: u32 = 30;
pub const CAPABILITY_TOKENS: u32 = 45;

/// AI service double answering both capabilities
///
/// A `None` answer makes that call fail as if the service were down.
#[derive(Debug)]
pub struct MockAi {
    pub style: Option<(&'static str, f64)>,
    pub trait_: Option<(&'static str, f64)>,
    pub name: Option<&'static str>,
    pub capability: Option<&'static str>,
    pub calls: AtomicUsize,
}

impl Default for MockAi {
    fn default() -> Self {
        Self {
            style: Some(("technical", 0.85)),
            trait_: Some(("analytical", 0.82)),
            name: Some("\"Query Quantum\""),
            capability: Some("Processes petabytes in milliseconds"),
            calls: AtomicUsize::new(0),
        }
    }
}

impl MockAi {
    /// Every call fails
    pub fn down() -> Self {
        Self {
            style: None,
            trait_: None,
            name: None,
            capability: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn unavailable() -> ServiceError {
    ServiceError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl ClassificationService for MockAi {
    async fn classify(
        &self,
        _image: &ImagePayload,
        label_set: LabelSet,
    ) -> Result<RawClassification, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = match label_set {
            LabelSet::Style => self.style,
            LabelSet::Trait => self.trait_,
        };
        answer
            .map(|(label, confidence)| RawClassification {
                label: label.to_string(),
                confidence,
            })
            .ok_or_else(unavailable)
    }
}

#[async_trait]
impl GenerationService for MockAi {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<Completion, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (answer, tokens) = if prompt.contains("superpower") {
            (self.capability, CAPABILITY_TOKENS)
        } else {
            (self.name, NAME_TOKENS)
        };
        answer
            .map(|text| Completion {
                text: text.to_string(),
                tokens_used: tokens,
            })
            .ok_or_else(unavailable)
    }
}

pub fn default_pipeline_config() -> PipelineConfig {
    PipelineConfig::from_toml(&TomlConfig::default()).unwrap()
}

/// Pipeline wired to `ai` for both capabilities
pub fn pipeline_with(ai: Arc<MockAi>, pool: SqlitePool) -> GenerationPipeline {
    GenerationPipeline::from_config(&default_pipeline_config(), ai.clone(), ai, pool)
}
