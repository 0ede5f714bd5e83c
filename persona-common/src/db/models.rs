//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::labels::{StyleLabel, TraitLabel};

/// Category recorded when the matcher has nothing to choose from
pub const DEFAULT_CATEGORY: &str = "Data Hero";

/// Pipeline stages that can fall back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    StyleClassification,
    TraitClassification,
    IdentityName,
    Capability,
    SafetyGate,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::StyleClassification => "style_classification",
            Stage::TraitClassification => "trait_classification",
            Stage::IdentityName => "identity_name",
            Stage::Capability => "capability",
            Stage::SafetyGate => "safety_gate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One substitution made by the fallback controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackRecord {
    pub stage: Stage,
    pub reason: String,
}

/// Where the event's category came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySource {
    /// Picked from the stored category records
    #[default]
    Matched,
    /// Category store empty or unreadable; [`DEFAULT_CATEGORY`] used
    Default,
}

/// Structured analysis record stored with each event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// True iff `fallbacks` is non-empty
    pub degraded: bool,
    /// Free-form provenance note
    pub provenance: String,
    /// Classifier confidence for the style label (0.0 for fallbacks)
    pub style_confidence: f32,
    /// Classifier confidence for the trait label (0.0 for fallbacks)
    pub trait_confidence: f32,
    /// Stages that used their fallback path, in pipeline order
    #[serde(default)]
    pub fallbacks: Vec<FallbackRecord>,
    #[serde(default)]
    pub category_source: CategorySource,
    /// Generation model requested from the service
    #[serde(default)]
    pub model: String,
}

impl AnalysisMetadata {
    /// `degraded` agrees with the fallback list
    pub fn is_consistent(&self) -> bool {
        self.degraded == !self.fallbacks.is_empty()
    }

    /// Whether a given stage fell back
    pub fn fell_back(&self, stage: Stage) -> bool {
        self.fallbacks.iter().any(|record| record.stage == stage)
    }
}

/// Static contextual tags (venue/event identifiers)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextData(BTreeMap<String, String>);

impl ContextData {
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, String>> for ContextData {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Completed pipeline run, before the store assigns a timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVisitorEvent {
    pub visit_id: Uuid,
    pub identity_name: String,
    pub capability_text: String,
    pub category: String,
    pub style_label: StyleLabel,
    pub trait_label: TraitLabel,
    pub tokens_used: u32,
    pub analysis_metadata: AnalysisMetadata,
    pub context_data: ContextData,
}

impl NewVisitorEvent {
    pub fn degraded(&self) -> bool {
        self.analysis_metadata.degraded
    }

    /// Field-level validity every persisted event must satisfy
    pub fn validate(&self) -> crate::Result<()> {
        let blank = |s: &str| s.trim().is_empty();
        if blank(&self.identity_name) {
            return Err(crate::Error::InvalidInput("identity_name is empty".to_string()));
        }
        if blank(&self.capability_text) {
            return Err(crate::Error::InvalidInput("capability_text is empty".to_string()));
        }
        if blank(&self.category) {
            return Err(crate::Error::InvalidInput("category is empty".to_string()));
        }
        if !self.analysis_metadata.is_consistent() {
            return Err(crate::Error::InvalidInput(
                "degraded flag disagrees with fallback records".to_string(),
            ));
        }
        Ok(())
    }
}

/// Persisted event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitorEvent {
    /// Assigned by the Event Store at write time
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: NewVisitorEvent,
}

/// Static category reference record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub category_id: String,
    pub name: String,
    pub description: String,
    pub traits_vector: Vec<String>,
    pub sample_names: Vec<String>,
    pub sample_capabilities: Vec<String>,
}

impl CategoryRecord {
    /// True if any tag matches one of the given labels (case-insensitive)
    pub fn has_affinity(&self, labels: &[&str]) -> bool {
        self.traits_vector.iter().any(|tag| {
            labels
                .iter()
                .any(|label| tag.trim().eq_ignore_ascii_case(label))
        })
    }
}
