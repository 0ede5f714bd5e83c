//! Generation pipeline
//!
//! Runs one visitor interaction end to end:
//! 1. Classify style and trait (two concurrent service calls)
//! 2. Generate the identity name, then the capability
//! 3. Match a category
//! 4. Review the text with the safety gate
//! 5. Append the event to the store
//!
//! # Error Handling
//! - Stage failures never abort a run; the fallback controller substitutes
//! - [`GenerationPipeline::run`] always yields a complete candidate event
//! - A failed append is reported as a warning alongside the persona

use persona_common::db::models::{AnalysisMetadata, NewVisitorEvent, Stage};
use persona_common::db::EventStore;
use persona_common::{SessionContext, StyleLabel, TraitLabel};
use rand::Rng;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::models::ImagePayload;
use crate::services::{
    CategoryMatcher, Classification, ClassificationService, FallbackController, GeneratedText,
    GenerationService, MinLengthPolicy, SafetyGate, StyleTraitClassifier, TextGenerator,
    TextKind, SAFE_CAPABILITY, SAFE_NAME,
};

/// Result of a run plus its persistence status
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub event: NewVisitorEvent,
    pub persisted: bool,
    /// Set when the event could not be stored
    pub warning: Option<String>,
}

pub struct GenerationPipeline {
    classifier: StyleTraitClassifier,
    generator: TextGenerator,
    matcher: CategoryMatcher,
    gate: SafetyGate,
    store: EventStore,
}

impl GenerationPipeline {
    pub fn new(
        classifier: StyleTraitClassifier,
        generator: TextGenerator,
        matcher: CategoryMatcher,
        gate: SafetyGate,
        store: EventStore,
    ) -> Self {
        Self {
            classifier,
            generator,
            matcher,
            gate,
            store,
        }
    }

    /// Wire the stages from configuration and service backends
    pub fn from_config(
        config: &PipelineConfig,
        classification: Arc<dyn ClassificationService>,
        generation: Arc<dyn GenerationService>,
        pool: SqlitePool,
    ) -> Self {
        Self::new(
            StyleTraitClassifier::new(classification),
            TextGenerator::new(
                generation,
                config.name_max_tokens,
                config.capability_max_tokens,
            ),
            CategoryMatcher::new(pool.clone()),
            SafetyGate::new(Arc::new(MinLengthPolicy::new(config.min_length))),
            EventStore::new(pool),
        )
    }

    /// Replace the event store, e.g. one with a pinned clock
    pub fn with_store(mut self, store: EventStore) -> Self {
        self.store = store;
        self
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Produce a candidate event; never fails
    pub async fn run<R>(
        &self,
        image: &ImagePayload,
        session: &SessionContext,
        rng: &mut R,
    ) -> NewVisitorEvent
    where
        R: Rng + Send + ?Sized,
    {
        let mut fallbacks = FallbackController::new();

        let (style_result, trait_result) = tokio::join!(
            self.classifier.classify::<StyleLabel>(image),
            self.classifier.classify::<TraitLabel>(image),
        );

        let style = style_result.unwrap_or_else(|failure| {
            Classification::fallback(fallbacks.substitute_label(
                Stage::StyleClassification,
                &failure,
                rng,
            ))
        });
        let trait_ = trait_result.unwrap_or_else(|failure| {
            Classification::fallback(fallbacks.substitute_label(
                Stage::TraitClassification,
                &failure,
                rng,
            ))
        });

        let name = match self.generator.identity_name(style.label, trait_.label).await {
            Ok(name) => name,
            Err(failure) => GeneratedText::fallback(fallbacks.substitute_text(
                TextKind::IdentityName,
                &failure,
                rng,
            )),
        };

        let capability = match self.generator.capability(&name.text, trait_.label).await {
            Ok(capability) => capability,
            Err(failure) => GeneratedText::fallback(fallbacks.substitute_text(
                TextKind::Capability,
                &failure,
                rng,
            )),
        };

        let category = self
            .matcher
            .match_category(style.label, trait_.label, rng)
            .await;

        let tokens_used = name.tokens_used.saturating_add(capability.tokens_used);
        let (identity_name, capability_text) = match self.gate.review(&name.text, &capability.text)
        {
            Ok(()) => (name.text, capability.text),
            Err(rejected) => {
                fallbacks.record(Stage::SafetyGate, rejected.to_string());
                (SAFE_NAME.to_string(), SAFE_CAPABILITY.to_string())
            }
        };

        let records = fallbacks.into_records();
        let provenance = if records.is_empty() {
            "ai_service".to_string()
        } else {
            let stages: Vec<&str> = records.iter().map(|r| r.stage.as_str()).collect();
            format!("fallback: {}", stages.join(", "))
        };

        NewVisitorEvent {
            visit_id: session.visit_id(),
            identity_name,
            capability_text,
            category: category.name,
            style_label: style.label,
            trait_label: trait_.label,
            tokens_used,
            analysis_metadata: AnalysisMetadata {
                degraded: !records.is_empty(),
                provenance,
                style_confidence: style.confidence,
                trait_confidence: trait_.confidence,
                fallbacks: records,
                category_source: category.source,
                model: self.generator.model().to_string(),
            },
            context_data: session.context_data().clone(),
        }
    }

    /// Run the pipeline and append the result
    pub async fn generate_and_store<R>(
        &self,
        image: &ImagePayload,
        session: &SessionContext,
        rng: &mut R,
    ) -> GenerationOutcome
    where
        R: Rng + Send + ?Sized,
    {
        let event = self.run(image, session, rng).await;
        let visit_id: Uuid = event.visit_id;

        match self.store.append(&event).await {
            Ok(_) => {
                info!(
                    visit_id = %visit_id,
                    category = %event.category,
                    degraded = event.degraded(),
                    tokens_used = event.tokens_used,
                    "Persona generated"
                );
                GenerationOutcome {
                    event,
                    persisted: true,
                    warning: None,
                }
            }
            Err(e) => {
                error!(visit_id = %visit_id, error = %e, "Failed to persist visitor event");
                GenerationOutcome {
                    event,
                    persisted: false,
                    warning: Some(format!("Persona generated but not saved: {}", e)),
                }
            }
        }
    }
}
