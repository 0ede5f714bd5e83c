//! Persona generation endpoint

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use persona_common::db::models::AnalysisMetadata;
use persona_common::{SessionContext, StyleLabel, TraitLabel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::ImagePayload;
use crate::workflow::GenerationOutcome;
use crate::AppState;

/// POST /api/generate request
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub image_base64: String,
    /// Client-chosen visit id; generated when absent
    pub visit_id: Option<Uuid>,
}

/// POST /api/generate response
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub visit_id: Uuid,
    pub identity_name: String,
    pub capability_text: String,
    pub category: String,
    pub style_label: StyleLabel,
    pub trait_label: TraitLabel,
    pub tokens_used: u32,
    pub degraded: bool,
    pub analysis_metadata: AnalysisMetadata,
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<GenerationOutcome> for GenerateResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        let event = outcome.event;
        Self {
            visit_id: event.visit_id,
            degraded: event.degraded(),
            identity_name: event.identity_name,
            capability_text: event.capability_text,
            category: event.category,
            style_label: event.style_label,
            trait_label: event.trait_label,
            tokens_used: event.tokens_used,
            analysis_metadata: event.analysis_metadata,
            persisted: outcome.persisted,
            warning: outcome.warning,
        }
    }
}

/// POST /api/generate
///
/// Rejects malformed images with 400; otherwise always returns a persona,
/// with `persisted = false` and a `warning` if the event was not stored.
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if request.visit_id == Some(Uuid::nil()) {
        return Err(ApiError::BadRequest("visit_id must not be nil".to_string()));
    }

    let image = ImagePayload::from_base64(&request.image_base64)?;

    let context = state.context.clone();
    let session = match request.visit_id {
        Some(id) => SessionContext::visitor_with_id(id, context),
        None => SessionContext::visitor(context),
    };

    let mut rng = StdRng::from_entropy();
    let outcome = state
        .pipeline
        .generate_and_store(&image, &session, &mut rng)
        .await;

    Ok(Json(GenerateResponse::from(outcome)))
}

/// Build generation routes
pub fn generate_routes() -> Router<AppState> {
    Router::new().route("/api/generate", post(generate))
}
