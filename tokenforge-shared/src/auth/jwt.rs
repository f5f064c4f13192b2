/// Session credential issue and validation
///
/// Session credentials are JWTs signed with HS256. They carry the user's id,
/// email, subscription tier and GitHub id so handlers can identify the caller
/// without a database round trip. The tier claim is informational; quota
/// checks always re-read the tier from the database.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: Configurable, 7 days by default
/// - **Validation**: Signature, expiration, not-before and issuer checks
/// - **Secret Management**: Secrets should be at least 32 bytes (256 bits)
///
/// # Example
///
/// ```
/// use tokenforge_shared::auth::jwt::{create_token, validate_token, Claims};
/// use tokenforge_shared::models::user::SubscriptionTier;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let claims = Claims::new(
///     user_id,
///     "octocat@github.com".to_string(),
///     SubscriptionTier::Free,
///     Some("583231".to_string()),
///     Duration::days(7),
/// );
///
/// let token = create_token(&claims, "your-secret-key-at-least-32-bytes")?;
/// let validated = validate_token(&token, "your-secret-key-at-least-32-bytes")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::{SubscriptionTier, User};

/// Issuer claim written into and required on every session credential
pub const ISSUER: &str = "tokenforge";

/// Default session lifetime
pub const DEFAULT_EXPIRY_DAYS: i64 = 7;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was issued by someone else
    #[error("Invalid issuer: expected {}", ISSUER)]
    InvalidIssuer,
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "tokenforge")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
/// - `nbf`: Not before timestamp
///
/// # Custom Claims
///
/// - `email`: User email at issue time
/// - `tier`: Subscription tier at issue time
/// - `github_id`: GitHub account id, when the user signed in with GitHub
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "tokenforge"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Email (custom claim)
    pub email: String,

    /// Subscription tier (custom claim)
    pub tier: SubscriptionTier,

    /// GitHub account id (custom claim)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_id: Option<String>,
}

impl Claims {
    /// Creates claims expiring `expires_in` from now
    pub fn new(
        user_id: Uuid,
        email: String,
        tier: SubscriptionTier,
        github_id: Option<String>,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            email,
            tier,
            github_id,
        }
    }

    /// Creates claims describing a stored user
    pub fn for_user(user: &User, expires_in: Duration) -> Self {
        Self::new(
            user.id,
            user.email.clone(),
            user.tier,
            user.github_id.clone(),
            expires_in,
        )
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Creates a signed JWT from claims
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT and extracts its claims
///
/// Verifies the signature, expiry, not-before time and issuer.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}
