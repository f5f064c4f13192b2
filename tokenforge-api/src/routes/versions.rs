/// Version history endpoints
///
/// - `GET /projects/:id/versions` - Newest first, without snapshots
/// - `GET /projects/:id/versions/:version_id` - One version with its snapshot

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::parse_id,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tokenforge_shared::{
    auth::{
        middleware::AuthContext,
        ownership::{require_project_owner, AccessMode},
    },
    models::version::{Version, VersionSummary},
};

pub async fn list_versions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<VersionSummary>>> {
    let project_id = parse_id(&id, "project")?;

    require_project_owner(&state.db, project_id, auth.user_id, AccessMode::Read).await?;
    let versions = Version::list_summaries(&state.db, project_id).await?;

    Ok(Json(versions))
}

/// Fetches one version
///
/// A version id from a different project answers 404.
pub async fn get_version(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, version_id)): Path<(String, String)>,
) -> ApiResult<Json<Version>> {
    let project_id = parse_id(&id, "project")?;
    let version_id = parse_id(&version_id, "version")?;

    require_project_owner(&state.db, project_id, auth.user_id, AccessMode::Read).await?;

    let version = Version::find_in_project(&state.db, project_id, version_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Version not found".to_string()))?;

    Ok(Json(version))
}
