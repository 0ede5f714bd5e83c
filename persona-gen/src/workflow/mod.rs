//! Per-visitor generation workflow

pub mod pipeline;

pub use pipeline::{GenerationOutcome, GenerationPipeline};
