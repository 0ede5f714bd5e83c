//! Dashboard password gate
//!
//! Staff authenticate with `Authorization: Bearer <password>`. Only the
//! SHA-256 digest of the configured password is kept in memory; candidates
//! are digested and compared in constant time.
//!
//! # Pure Functions
//!
//! No HTTP framework dependencies. The dashboard wraps [`DashboardGate`] in
//! its axum middleware.

use sha2::{Digest, Sha256};

use crate::session::SessionContext;

/// Authentication failure kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// No credentials supplied
    MissingCredentials,
    /// Authorization header not in `Bearer <password>` form
    MalformedCredentials,
    /// Password does not match
    InvalidPassword,
}

impl std::fmt::Display for GateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateError::MissingCredentials => write!(f, "Missing credentials"),
            GateError::MalformedCredentials => write!(f, "Malformed Authorization header"),
            GateError::InvalidPassword => write!(f, "Incorrect password"),
        }
    }
}

impl std::error::Error for GateError {}

/// SHA-256 digest as 64 lowercase hex characters
///
/// ```
/// use persona_common::api::auth::password_digest;
///
/// let digest = password_digest("booth-staff");
/// assert_eq!(digest.len(), 64);
/// assert_eq!(digest, password_digest("booth-staff"));
/// ```
pub fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Password gate guarding the analytics interface
///
/// A gate built without a password is open: every request receives a staff
/// session.
#[derive(Debug, Clone)]
pub struct DashboardGate {
    digest: Option<String>,
}

impl DashboardGate {
    pub fn new(password: Option<&str>) -> Self {
        let digest = password
            .filter(|p| !p.is_empty())
            .map(password_digest);
        Self { digest }
    }

    /// Gate that admits every request
    pub fn open() -> Self {
        Self { digest: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.digest.is_some()
    }

    /// Validate an `Authorization` header value and issue a staff session
    pub fn authorize(&self, authorization: Option<&str>) -> Result<SessionContext, GateError> {
        let expected = match &self.digest {
            None => return Ok(SessionContext::staff()),
            Some(digest) => digest,
        };

        let header = authorization.ok_or(GateError::MissingCredentials)?;
        let password = header
            .strip_prefix("Bearer ")
            .ok_or(GateError::MalformedCredentials)?;

        if constant_time_eq(password_digest(password).as_bytes(), expected.as_bytes()) {
            Ok(SessionContext::staff())
        } else {
            Err(GateError::InvalidPassword)
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
