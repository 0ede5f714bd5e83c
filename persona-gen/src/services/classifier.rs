//! Style/trait classifier
//!
//! One service call per label set. The answer is only accepted if it names a
//! member of the requested set and carries a finite confidence.

use persona_common::Label;
use std::sync::Arc;
use tracing::debug;

use crate::models::ImagePayload;
use crate::services::fallback::StageFailure;
use crate::services::service_client::ClassificationService;

/// A label with its confidence in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification<L> {
    pub label: L,
    pub confidence: f32,
}

impl<L: Label> Classification<L> {
    /// Confidence recorded for a substituted label
    pub fn fallback(label: L) -> Self {
        Self {
            label,
            confidence: 0.0,
        }
    }
}

pub struct StyleTraitClassifier {
    service: Arc<dyn ClassificationService>,
}

impl StyleTraitClassifier {
    pub fn new(service: Arc<dyn ClassificationService>) -> Self {
        Self { service }
    }

    /// Classify `image` against the label set of `L`
    pub async fn classify<L: Label>(
        &self,
        image: &ImagePayload,
    ) -> Result<Classification<L>, StageFailure> {
        let raw = self.service.classify(image, L::SET).await?;

        let label = L::parse_label(&raw.label).ok_or_else(|| {
            StageFailure::EmptyOrMalformedResponse(if raw.label.trim().is_empty() {
                format!("empty {} label", L::SET.name())
            } else {
                format!("'{}' is not a {} label", raw.label, L::SET.name())
            })
        })?;

        if !raw.confidence.is_finite() {
            return Err(StageFailure::EmptyOrMalformedResponse(format!(
                "confidence {} is not a number",
                raw.confidence
            )));
        }

        let confidence = raw.confidence.clamp(0.0, 1.0) as f32;
        debug!(label_set = L::SET.name(), label = label.as_str(), confidence, "Classified image");

        Ok(Classification { label, confidence })
    }
}
