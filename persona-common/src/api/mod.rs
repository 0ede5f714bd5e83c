//! API module for shared HTTP API functionality
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Shared types
//!
//! Each service wraps these with its own axum middleware and handlers.

pub mod auth;
pub mod types;

pub use auth::{password_digest, DashboardGate, GateError};
pub use types::{ErrorBody, ErrorDetail, HealthResponse};
