//! HTTP API for the generation service

pub mod generate;
pub mod health;

pub use generate::{generate, generate_routes, GenerateRequest, GenerateResponse};
pub use health::{health_check, health_routes};
