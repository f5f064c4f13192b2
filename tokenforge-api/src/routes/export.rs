/// Token export endpoint
///
/// ```text
/// GET /projects/:id/export?format=json|css|scss|less|tailwind
/// ```
///
/// Answers with the rendered file as an attachment. `format` defaults to
/// `json`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::parse_id,
};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Extension,
};
use serde::Deserialize;
use tokenforge_shared::{
    auth::{
        middleware::AuthContext,
        ownership::{require_project_owner, AccessMode},
    },
    export::{self, ExportFormat},
    models::token::Token,
};

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

pub async fn export_tokens(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<impl IntoResponse> {
    let project_id = parse_id(&id, "project")?;

    let format = match query.format.as_deref() {
        None => ExportFormat::default(),
        Some(raw) => ExportFormat::from_str(raw)
            .ok_or_else(|| ApiError::BadRequest(format!("Unsupported export format '{}'", raw)))?,
    };

    require_project_owner(&state.db, project_id, auth.user_id, AccessMode::Read).await?;
    let tokens = Token::list_by_project(&state.db, project_id).await?;

    let body = export::render(&tokens, format)
        .map_err(|e| ApiError::InternalError(format!("Export rendering failed: {}", e)))?;

    tracing::debug!(%project_id, format = ?format, tokens = tokens.len(), "Tokens exported");

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", format.file_name()),
            ),
        ],
        body,
    ))
}
