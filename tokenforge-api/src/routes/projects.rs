/// Project endpoints
///
/// All scoped to the session user.
///
/// - `GET /projects` - Projects owned by the caller, newest first
/// - `POST /projects` - Create a project (plan quota applies)
/// - `DELETE /projects/:id` - Delete a project with its tokens and versions

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::{parse_id, ApiJson},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tokenforge_shared::{
    auth::{middleware::AuthContext, ownership::delete_owned_project},
    models::project::{validate_name, Project},
    quota::create_project_within_quota,
};

/// Create project request
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = Project::list_by_owner(&state.db, auth.user_id).await?;
    Ok(Json(projects))
}

/// Creates a project
///
/// # Errors
///
/// - `400 Bad Request`: Name missing, blank or too long
/// - `403 Forbidden`: Project limit of the caller's plan reached
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let name = validate_name(req.name.as_deref()).map_err(|message| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "name".to_string(),
            message,
        }])
    })?;

    let project = create_project_within_quota(&state.db, auth.user_id, &name).await?;

    Ok((StatusCode::CREATED, Json(project)))
}

/// Deletes a project
///
/// A project owned by someone else answers 404, same as a missing one.
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let project_id = parse_id(&id, "project")?;

    delete_owned_project(&state.db, project_id, auth.user_id).await?;

    Ok(Json(MessageResponse {
        message: "Project deleted successfully".to_string(),
    }))
}
