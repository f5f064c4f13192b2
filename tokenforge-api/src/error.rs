/// Error handling for the API server
///
/// One error type maps every failure to an HTTP response. Handlers return
/// `ApiResult<T>`; library errors convert through `?`.
///
/// Every body carries a human-readable `error` string. Field-level validation
/// failures add a `details` array. Causes of 500 responses are logged and
/// never sent to the client.
///
/// # Example
///
/// ```no_run
/// use tokenforge_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler() -> ApiResult<Json<serde_json::Value>> {
///     Err(ApiError::NotFound("Project not found".to_string()))
/// }
/// ```

use crate::providers::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokenforge_shared::{
    auth::{jwt::JwtError, middleware::AuthError, ownership::OwnershipError},
    billing::{events::EventError, reconcile::ReconcileError, signature::SignatureError},
    quota::QuotaError,
    versioning::{FieldError, VersioningError},
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Field validation failed (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Missing, expired or invalid session (401)
    Unauthorized(String),

    /// Plan limit reached (403)
    QuotaExceeded(String),

    /// Not found, or not owned by the caller (404)
    NotFound(String),

    /// Method not allowed on a known path (405)
    MethodNotAllowed,

    /// Store failure; the operation was rolled back (500)
    OperationFailed(String),

    /// Internal server error (500)
    InternalError(String),

    /// A provider integration lacks credentials (500)
    NotConfigured(&'static str),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl From<FieldError> for ValidationErrorDetail {
    fn from(err: FieldError) -> Self {
        Self {
            field: err.field.to_string(),
            message: err.message,
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::QuotaExceeded(msg) => write!(f, "Quota exceeded: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::MethodNotAllowed => write!(f, "Method not allowed"),
            ApiError::OperationFailed(msg) => write!(f, "Operation failed: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::NotConfigured(what) => write!(f, "{} is not configured", what),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::QuotaExceeded(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::OperationFailed(_)
            | ApiError::InternalError(_)
            | ApiError::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, details) = match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::QuotaExceeded(msg)
            | ApiError::NotFound(msg) => (msg, None),
            ApiError::ValidationError(errors) => {
                let message = errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                (message, Some(errors))
            }
            ApiError::MethodNotAllowed => ("Method not allowed".to_string(), None),
            ApiError::OperationFailed(cause) => {
                tracing::error!(error = %cause, "Token/version write failed");
                ("token/version write failed".to_string(), None)
            }
            ApiError::InternalError(cause) => {
                // Log internal errors but don't expose details to clients
                tracing::error!(error = %cause, "Internal error");
                ("An internal error occurred".to_string(), None)
            }
            ApiError::NotConfigured(what) => {
                tracing::error!("{} is not configured", what);
                (format!("{} is not configured", what), None)
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::InternalError(format!("Database error: {}", err))
    }
}

/// Convert token write errors to API errors
impl From<VersioningError> for ApiError {
    fn from(err: VersioningError) -> Self {
        match err {
            VersioningError::Validation(errors) => {
                ApiError::ValidationError(errors.into_iter().map(Into::into).collect())
            }
            VersioningError::NotFoundOrForbidden => {
                ApiError::NotFound("Project not found".to_string())
            }
            VersioningError::QuotaExceeded(quota) => quota.into(),
            VersioningError::OperationFailed(cause) => {
                ApiError::OperationFailed(cause.to_string())
            }
        }
    }
}

/// Convert ownership errors to API errors
impl From<OwnershipError> for ApiError {
    fn from(err: OwnershipError) -> Self {
        match err {
            OwnershipError::NotFoundOrForbidden => {
                ApiError::NotFound("Project not found".to_string())
            }
            OwnershipError::Database(e) => e.into(),
        }
    }
}

/// Convert quota errors to API errors
impl From<QuotaError> for ApiError {
    fn from(err: QuotaError) -> Self {
        match err {
            QuotaError::LimitExceeded { .. } => ApiError::QuotaExceeded(err.to_string()),
            QuotaError::DatabaseError(e) => e.into(),
            QuotaError::UserNotFound(_) => ApiError::NotFound("User not found".to_string()),
        }
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => {
                ApiError::InternalError(format!("Failed to issue session: {}", msg))
            }
            other => AuthError::from(other).into(),
        }
    }
}

/// Convert webhook signature errors to API errors
impl From<SignatureError> for ApiError {
    fn from(err: SignatureError) -> Self {
        ApiError::BadRequest(format!("Webhook signature verification failed: {}", err))
    }
}

/// Convert webhook payload errors to API errors
impl From<EventError> for ApiError {
    fn from(err: EventError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

/// Convert reconciliation errors to API errors
impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Invalid(msg) => ApiError::BadRequest(msg),
            ReconcileError::Database(e) => e.into(),
        }
    }
}

/// Convert provider errors to API errors
impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Rejected(msg) => ApiError::BadRequest(msg),
            ProviderError::Upstream(msg) => ApiError::InternalError(msg),
            ProviderError::NotConfigured(what) => ApiError::NotConfigured(what),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenforge_shared::{models::user::SubscriptionTier, quota::QuotaKind};

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Project not found".to_string());
        assert_eq!(err.to_string(), "Not found: Project not found");
    }

    #[tokio::test]
    async fn test_validation_error_body() {
        let err = ApiError::ValidationError(vec![
            ValidationErrorDetail {
                field: "name".to_string(),
                message: "name is required".to_string(),
            },
            ValidationErrorDetail {
                field: "type".to_string(),
                message: "type is required".to_string(),
            },
        ]);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");

        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "name is required; type is required");
        assert_eq!(body["details"][1]["field"], "type");
    }

    #[tokio::test]
    async fn test_operation_failed_hides_cause() {
        let err: ApiError = VersioningError::OperationFailed(sqlx::Error::PoolTimedOut).into();
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "token/version write failed");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let err: ApiError = sqlx::Error::PoolClosed.into();
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "An internal error occurred");
    }

    #[test]
    fn test_status_mapping() {
        let not_owned: ApiError = VersioningError::NotFoundOrForbidden.into();
        assert_eq!(not_owned.status(), StatusCode::NOT_FOUND);

        let quota: ApiError = QuotaError::LimitExceeded {
            kind: QuotaKind::Projects,
            tier: SubscriptionTier::Free,
            limit: 1,
        }
        .into();
        assert_eq!(quota.status(), StatusCode::FORBIDDEN);

        let auth: ApiError = AuthError::MissingCredentials.into();
        assert_eq!(auth.status(), StatusCode::UNAUTHORIZED);

        let expired: ApiError = JwtError::Expired.into();
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);

        let sig: ApiError = SignatureError::Mismatch.into();
        assert_eq!(sig.status(), StatusCode::BAD_REQUEST);

        let rejected: ApiError = ProviderError::Rejected("bad code".to_string()).into();
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

        let upstream: ApiError = ProviderError::Upstream("timeout".to_string()).into();
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(ApiError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
