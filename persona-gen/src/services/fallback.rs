//! Fallback controller
//!
//! Every stage failure flows through here. The controller hands back a valid
//! substitute drawn from a fixed list and records `{stage, reason}` so the
//! event ends up flagged as degraded.

use persona_common::db::models::{FallbackRecord, Stage};
use persona_common::Label;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::warn;

use crate::services::service_client::ServiceError;

/// Identity names used when generation fails
pub const FALLBACK_NAMES: [&str; 4] = [
    "The Data Wizard",
    "Cloud Commander",
    "Query Ninja",
    "AI Oracle",
];

/// Capability texts used when generation fails
pub const FALLBACK_CAPABILITIES: [&str; 4] = [
    "Transforms chaotic data into perfect insights",
    "Scales any workload effortlessly",
    "Optimizes queries at the speed of thought",
    "Predicts trends with supernatural accuracy",
];

/// Why a stage could not produce a usable value
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StageFailure {
    /// Endpoint unreachable, non-2xx, or timed out
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Empty output, unknown label, or a body that breaks the contract
    #[error("empty or malformed response: {0}")]
    EmptyOrMalformedResponse(String),
}

impl From<ServiceError> for StageFailure {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Malformed(_) => StageFailure::EmptyOrMalformedResponse(err.to_string()),
            ServiceError::Unavailable(_) | ServiceError::Timeout(_) | ServiceError::Api(..) => {
                StageFailure::ServiceUnavailable(err.to_string())
            }
        }
    }
}

/// Which generated text a fallback replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    IdentityName,
    Capability,
}

impl TextKind {
    pub fn stage(&self) -> Stage {
        match self {
            TextKind::IdentityName => Stage::IdentityName,
            TextKind::Capability => Stage::Capability,
        }
    }

    fn candidates(&self) -> &'static [&'static str] {
        match self {
            TextKind::IdentityName => &FALLBACK_NAMES,
            TextKind::Capability => &FALLBACK_CAPABILITIES,
        }
    }
}

/// Per-run fallback bookkeeping
///
/// One controller per pipeline run; it is never shared between runs.
#[derive(Debug, Default)]
pub struct FallbackController {
    records: Vec<FallbackRecord>,
}

impl FallbackController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stage failure without producing a substitute
    pub fn record(&mut self, stage: Stage, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(stage = %stage, reason = %reason, "Pipeline stage fell back");
        self.records.push(FallbackRecord { stage, reason });
    }

    /// Substitute label from the full label set
    pub fn substitute_label<L, R>(&mut self, stage: Stage, failure: &StageFailure, rng: &mut R) -> L
    where
        L: Label,
        R: Rng + ?Sized,
    {
        self.record(stage, failure.to_string());
        // Label sets are non-empty
        *L::all().choose(rng).unwrap_or(&L::all()[0])
    }

    /// Substitute text from the fallback list for `kind`
    pub fn substitute_text<R>(
        &mut self,
        kind: TextKind,
        failure: &StageFailure,
        rng: &mut R,
    ) -> String
    where
        R: Rng + ?Sized,
    {
        self.record(kind.stage(), failure.to_string());
        let candidates = kind.candidates();
        candidates.choose(rng).unwrap_or(&candidates[0]).to_string()
    }

    pub fn is_degraded(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<FallbackRecord> {
        self.records
    }
}
