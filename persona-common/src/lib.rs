//! # Persona Booth Common Library
//!
//! Shared code for the persona booth services:
//! - Visitor event and category models
//! - Event Store (append-only) and category reference data
//! - Style/trait label vocabularies
//! - Session context passed into every pipeline run and dashboard query
//! - Configuration loading
//! - Clock abstraction and timestamp helpers
//! - Dashboard password digests

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod labels;
pub mod session;
pub mod time;

pub use error::{Error, Result};
pub use labels::{Label, LabelSet, StyleLabel, TraitLabel};
pub use session::{SessionContext, SessionRole};
