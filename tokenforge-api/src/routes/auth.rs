/// Authentication endpoints
///
/// - `POST /auth/github` - Exchange a GitHub OAuth code for a session
/// - `GET /auth/me` - Current user for a session

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tokenforge_shared::{
    auth::{
        jwt::{create_token, Claims},
        middleware::AuthContext,
    },
    models::user::User,
};

/// GitHub sign-in request
#[derive(Debug, Deserialize)]
pub struct GithubLoginRequest {
    /// OAuth authorization code from the callback
    pub code: Option<String>,
}

/// Issued session
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Bearer credential
    pub token: String,

    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}

/// Signs in with GitHub
///
/// # Endpoint
///
/// ```text
/// POST /auth/github
/// Content-Type: application/json
///
/// { "code": "<oauth code>" }
/// ```
///
/// # Response
///
/// ```json
/// { "token": "eyJ...", "user": { "id": "uuid", "email": "...", "tier": "free", ... } }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing code, or GitHub rejected it
/// - `500 Internal Server Error`: OAuth not configured, or GitHub unreachable
pub async fn github_login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<GithubLoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let code = req
        .code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Authorization code is required.".to_string()))?;

    let identity = state.identity.exchange_code(code).await?;
    let email = identity.choose_email();

    let user = User::upsert_github(&state.db, &identity.id, &email).await?;

    let claims = Claims::for_user(&user, chrono::Duration::days(state.config.jwt.expiry_days));
    let token = create_token(&claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, github_id = %identity.id, "User signed in with GitHub");

    Ok(Json(SessionResponse { token, user }))
}

/// Returns the current user
///
/// The row is re-read, so tier changes since sign-in are visible.
///
/// # Errors
///
/// - `401 Unauthorized`: No valid session
/// - `404 Not Found`: The session's user no longer exists
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse { user }))
}
