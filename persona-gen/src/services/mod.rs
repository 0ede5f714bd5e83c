//! Pipeline stage implementations
//!
//! Each stage returns an explicit `Result`; failures are absorbed by the
//! [`FallbackController`](fallback::FallbackController).

pub mod category_matcher;
pub mod classifier;
pub mod fallback;
pub mod generator;
pub mod safety;
pub mod service_client;

pub use category_matcher::{choose_category, CategoryMatcher, MatchedCategory};
pub use classifier::{Classification, StyleTraitClassifier};
pub use fallback::{
    FallbackController, StageFailure, TextKind, FALLBACK_CAPABILITIES, FALLBACK_NAMES,
};
pub use generator::{clean_text, GeneratedText, TextGenerator};
pub use safety::{
    ContentPolicy, ContentRejected, MinLengthPolicy, SafetyGate, SAFE_CAPABILITY, SAFE_NAME,
};
pub use service_client::{
    ClassificationService, Completion, GenerationService, HttpAiService, RawClassification,
    ServiceError,
};
