//! Configuration resolution for persona-gen
//!
//! Turns the shared TOML configuration into the settings the generation
//! pipeline needs, rejecting values the pipeline cannot work with.

use persona_common::config::{AiServiceConfig, TomlConfig};
use persona_common::db::models::ContextData;
use persona_common::{Error, Result};
use tracing::{info, warn};

/// Settings consumed by [`GenerationPipeline`](crate::workflow::GenerationPipeline)
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub ai_service: AiServiceConfig,
    pub name_max_tokens: u32,
    pub capability_max_tokens: u32,
    pub min_length: usize,
    /// Tags copied into every visitor session
    pub context: ContextData,
}

impl PipelineConfig {
    pub fn from_toml(config: &TomlConfig) -> Result<Self> {
        let ai = &config.ai_service;

        if ai.timeout_ms == 0 {
            return Err(Error::Config("ai_service.timeout_ms must be positive".to_string()));
        }
        if ai.name_max_tokens == 0 || ai.capability_max_tokens == 0 {
            return Err(Error::Config(
                "ai_service token limits must be positive".to_string(),
            ));
        }
        if !(ai.base_url.starts_with("http://") || ai.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "ai_service.base_url must be an http(s) URL, got '{}'",
                ai.base_url
            )));
        }

        if ai.api_key.is_some() {
            info!("AI service API key configured");
        } else {
            warn!("No AI service API key configured; requests are sent unauthenticated");
        }

        Ok(Self {
            ai_service: ai.clone(),
            name_max_tokens: ai.name_max_tokens,
            capability_max_tokens: ai.capability_max_tokens,
            min_length: config.safety.min_length,
            context: config.context.to_context_data(),
        })
    }
}
