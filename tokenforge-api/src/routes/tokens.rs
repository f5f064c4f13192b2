/// Token endpoints
///
/// - `GET /projects/:id/tokens` - Current tokens of a project, by name
/// - `POST /projects/:id/tokens` - Write a token; appends a version

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{parse_id, ApiJson},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tokenforge_shared::{
    auth::{
        middleware::AuthContext,
        ownership::{require_project_owner, AccessMode},
    },
    models::token::Token,
    versioning::{self, TokenWrite},
};

/// Token write request
///
/// Fields are optional here so that missing ones produce field-level
/// validation errors instead of a body rejection.
#[derive(Debug, Deserialize)]
pub struct WriteTokenRequest {
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub token_type: Option<String>,

    pub value: Option<JsonValue>,
}

pub async fn list_tokens(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Token>>> {
    let project_id = parse_id(&id, "project")?;

    require_project_owner(&state.db, project_id, auth.user_id, AccessMode::Read).await?;
    let tokens = Token::list_by_project(&state.db, project_id).await?;

    Ok(Json(tokens))
}

/// Creates or updates a token by name
///
/// # Endpoint
///
/// ```text
/// POST /projects/:id/tokens
/// Content-Type: application/json
///
/// { "name": "color/primary", "type": "color", "value": "#FF0000" }
/// ```
///
/// # Response
///
/// `201 Created` with the stored token. The project's version history gains
/// one entry holding every token after this write.
///
/// # Errors
///
/// - `400 Bad Request`: Missing or invalid name, type or value
/// - `403 Forbidden`: Token limit of the caller's plan reached
/// - `404 Not Found`: Project missing or not owned by the caller
/// - `500 Internal Server Error`: The write was rolled back
pub async fn write_token(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<WriteTokenRequest>,
) -> ApiResult<(StatusCode, Json<Token>)> {
    let project_id = parse_id(&id, "project")?;
    let write = TokenWrite::from_parts(req.name, req.token_type, req.value)?;

    let outcome = versioning::write_token(&state.db, auth.user_id, project_id, write).await?;

    Ok((StatusCode::CREATED, Json(outcome.token)))
}
