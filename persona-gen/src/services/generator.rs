//! Text generator
//!
//! Builds the identity-name and capability prompts and cleans the completion
//! text. Output that is empty once whitespace and quote marks are stripped
//! counts as a malformed response.

use persona_common::{StyleLabel, TraitLabel};
use std::sync::Arc;
use tracing::debug;

use crate::services::fallback::StageFailure;
use crate::services::service_client::GenerationService;

/// Characters stripped from both ends of generated text
const QUOTE_CHARS: &[char] = &['"', '\'', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}', '`'];

/// Cleaned generated text with the tokens it cost
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedText {
    pub text: String,
    pub tokens_used: u32,
}

impl GeneratedText {
    /// Substituted text costs no tokens
    pub fn fallback(text: String) -> Self {
        Self {
            text,
            tokens_used: 0,
        }
    }
}

/// Prompt for the identity name
pub fn name_prompt(style: StyleLabel, trait_label: TraitLabel) -> String {
    format!(
        "Generate a data cloud superhero name for someone with {} style and {} traits. \
         The name should relate to data, AI, cloud computing, or analytics. \
         Be creative and professional. Return only the superhero name.",
        style, trait_label
    )
}

/// Prompt for the capability, built around the already-chosen name
pub fn capability_prompt(identity_name: &str, trait_label: TraitLabel) -> String {
    format!(
        "Create a data/AI-related superpower for {} that matches their {} personality. \
         Focus on data platform capabilities like scaling, performance, AI, or data governance. \
         Make it exciting and relevant to data professionals. \
         Return only the superpower description.",
        identity_name, trait_label
    )
}

/// Strip surrounding whitespace and quoting artifacts
///
/// Returns `None` when nothing is left.
///
/// ```
/// use persona_gen::services::generator::clean_text;
///
/// assert_eq!(clean_text("  \"Query Quantum\"\n").as_deref(), Some("Query Quantum"));
/// assert_eq!(clean_text(" '' "), None);
/// ```
pub fn clean_text(raw: &str) -> Option<String> {
    let cleaned = raw.trim_matches(|c: char| c.is_whitespace() || QUOTE_CHARS.contains(&c));
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

pub struct TextGenerator {
    service: Arc<dyn GenerationService>,
    name_max_tokens: u32,
    capability_max_tokens: u32,
}

impl TextGenerator {
    pub fn new(
        service: Arc<dyn GenerationService>,
        name_max_tokens: u32,
        capability_max_tokens: u32,
    ) -> Self {
        Self {
            service,
            name_max_tokens,
            capability_max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        self.service.model()
    }

    pub async fn identity_name(
        &self,
        style: StyleLabel,
        trait_label: TraitLabel,
    ) -> Result<GeneratedText, StageFailure> {
        self.generate(&name_prompt(style, trait_label), self.name_max_tokens)
            .await
    }

    pub async fn capability(
        &self,
        identity_name: &str,
        trait_label: TraitLabel,
    ) -> Result<GeneratedText, StageFailure> {
        self.generate(
            &capability_prompt(identity_name, trait_label),
            self.capability_max_tokens,
        )
        .await
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<GeneratedText, StageFailure> {
        let completion = self.service.complete(prompt, max_tokens).await?;

        let text = clean_text(&completion.text).ok_or_else(|| {
            StageFailure::EmptyOrMalformedResponse("completion text is empty".to_string())
        })?;

        debug!(tokens_used = completion.tokens_used, max_tokens, "Generated text");

        Ok(GeneratedText {
            text,
            tokens_used: completion.tokens_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::service_client::{Completion, ServiceError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every (prompt, max_tokens) it receives
    #[derive(Default)]
    struct Recorder {
        reply: String,
        calls: Mutex<Vec<(String, u32)>>,
    }

    #[async_trait]
    impl GenerationService for Recorder {
        fn model(&self) -> &str {
            "recorder"
        }

        async fn complete(
            &self,
            prompt: &str,
            max_tokens: u32,
        ) -> Result<Completion, ServiceError> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), max_tokens));
            Ok(Completion {
                text: self.reply.clone(),
                tokens_used: 42,
            })
        }
    }

    #[test]
    fn test_clean_text_strips_typographic_quotes() {
        assert_eq!(
            clean_text("\u{201C}The Scale Master\u{201D}").as_deref(),
            Some("The Scale Master")
        );
        assert_eq!(clean_text("O'Brien").as_deref(), Some("O'Brien"));
        assert_eq!(clean_text("\n\t\"\"  "), None);
    }

    #[test]
    fn test_prompts_carry_labels_and_name() {
        let prompt = name_prompt(StyleLabel::Technical, TraitLabel::Innovative);
        assert!(prompt.contains("technical style"));
        assert!(prompt.contains("innovative traits"));

        let prompt = capability_prompt("Elastico", TraitLabel::Collaborative);
        assert!(prompt.contains("for Elastico"));
        assert!(prompt.contains("collaborative personality"));
    }

    #[tokio::test]
    async fn test_uses_configured_token_bounds() {
        let recorder = Arc::new(Recorder {
            reply: " \"Elastico\" ".to_string(),
            ..Recorder::default()
        });
        let generator = TextGenerator::new(recorder.clone(), 100, 150);

        let name = generator
            .identity_name(StyleLabel::Casual, TraitLabel::Confident)
            .await
            .unwrap();
        assert_eq!(name.text, "Elastico");
        assert_eq!(name.tokens_used, 42);

        generator
            .capability(&name.text, TraitLabel::Confident)
            .await
            .unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls[0].1, 100);
        assert_eq!(calls[1].1, 150);
    }

    #[tokio::test]
    async fn test_quote_only_reply_is_malformed() {
        let generator = TextGenerator::new(
            Arc::new(Recorder {
                reply: "\"\"".to_string(),
                ..Recorder::default()
            }),
            100,
            150,
        );
        let result = generator
            .identity_name(StyleLabel::Casual, TraitLabel::Confident)
            .await;
        assert!(matches!(result, Err(StageFailure::EmptyOrMalformedResponse(_))));
    }
}
