/// Session authentication for Axum
///
/// Extracts the `Authorization: Bearer <token>` credential, validates it and
/// exposes the caller as an [`AuthContext`] in request extensions. Every
/// handler that touches projects, tokens or versions derives the requesting
/// user from this context and nothing else.
///
/// # Example
///
/// ```no_run
/// use axum::http::HeaderMap;
/// use tokenforge_shared::auth::middleware::{authenticate, AuthContext, AuthError};
///
/// fn caller(headers: &HeaderMap) -> Result<AuthContext, AuthError> {
///     authenticate(headers, "your-jwt-secret")
/// }
/// ```
///
/// The API server wraps this in a router layer that inserts the context.

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, Claims, JwtError};
use crate::models::user::SubscriptionTier;

/// Authenticated caller, added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email at credential issue time
    pub email: String,

    /// Tier at credential issue time
    pub tier: SubscriptionTier,

    /// GitHub account id, if any
    pub github_id: Option<String>,
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            tier: claims.tier,
            github_id: claims.github_id,
        }
    }
}

/// Error type for authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing authorization header")]
    MissingCredentials,

    /// Authorization header is not a bearer credential
    #[error("Expected Bearer token")]
    InvalidFormat,

    /// Credential expired, forged or otherwise unusable
    #[error("Invalid token")]
    InvalidToken,
}

/// Every validation failure reads the same to the client
impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        tracing::debug!(error = %err, "Session credential rejected");
        AuthError::InvalidToken
    }
}

/// Validates the bearer credential in `headers`
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidFormat)?;

    let claims = validate_token(token, secret)?;
    Ok(AuthContext::from(claims))
}
