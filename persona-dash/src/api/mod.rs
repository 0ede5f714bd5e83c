//! HTTP API handlers for persona-dash

pub mod analytics;
pub mod auth;
pub mod health;

pub use analytics::{analytics_routes, AnalyticsQuery, AnalyticsReport};
pub use auth::{auth_middleware, AuthError};
pub use health::health_routes;
