//! Safety gate
//!
//! Generated text is reviewed as `"{name}: {capability}"` against a
//! [`ContentPolicy`]. Rejected text is replaced by a fixed safe pair.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Replacement identity name for rejected content
pub const SAFE_NAME: &str = "The Data Guardian";
/// Replacement capability for rejected content
pub const SAFE_CAPABILITY: &str = "Protects and optimizes data with unmatched precision";

/// Content rejected by the active policy
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("content rejected by {policy}: {reason}")]
pub struct ContentRejected {
    pub policy: String,
    pub reason: String,
}

/// Content policy applied to the combined generated text
pub trait ContentPolicy: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// `Err(reason)` if `combined` must not be shown
    fn evaluate(&self, combined: &str) -> Result<(), String>;
}

/// Rejects text whose character count is at or below a threshold
#[derive(Debug, Clone, Copy)]
pub struct MinLengthPolicy {
    min_length: usize,
}

impl MinLengthPolicy {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }
}

impl Default for MinLengthPolicy {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ContentPolicy for MinLengthPolicy {
    fn name(&self) -> &str {
        "min_length"
    }

    fn evaluate(&self, combined: &str) -> Result<(), String> {
        let length = combined.chars().count();
        if length <= self.min_length {
            Err(format!(
                "{} characters, needs more than {}",
                length, self.min_length
            ))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone)]
pub struct SafetyGate {
    policy: Arc<dyn ContentPolicy>,
}

impl SafetyGate {
    pub fn new(policy: Arc<dyn ContentPolicy>) -> Self {
        Self { policy }
    }

    pub fn combined(identity_name: &str, capability: &str) -> String {
        format!("{}: {}", identity_name, capability)
    }

    pub fn review(&self, identity_name: &str, capability: &str) -> Result<(), ContentRejected> {
        self.policy
            .evaluate(&Self::combined(identity_name, capability))
            .map_err(|reason| ContentRejected {
                policy: self.policy.name().to_string(),
                reason,
            })
    }
}

impl Default for SafetyGate {
    fn default() -> Self {
        Self::new(Arc::new(MinLengthPolicy::default()))
    }
}
