//! Authentication middleware for persona-dash
//!
//! Staff send `Authorization: Bearer <password>`. On success the handler
//! receives a staff [`SessionContext`] as a request extension.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use persona_common::api::{ErrorBody, GateError};
use tracing::{debug, warn};

use crate::AppState;

/// Authentication middleware
///
/// Applied to the analytics routes only; `/health` stays public.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let session = state.gate.authorize(authorization).map_err(|e| {
        warn!(path = %request.uri().path(), reason = %e, "Dashboard authentication failed");
        AuthError(e)
    })?;

    debug!(session = %session.visit_id(), role = ?session.role(), "Staff session issued");
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

/// Rejected credentials
#[derive(Debug)]
pub struct AuthError(pub GateError);

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ErrorBody::new("UNAUTHORIZED", self.0.to_string());
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            Json(body),
        )
            .into_response()
    }
}
