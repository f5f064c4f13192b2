/// Project ownership checks
///
/// Every operation on a project, its tokens or its versions starts here. A
/// project that does not exist and a project owned by someone else produce the
/// same [`OwnershipError::NotFoundOrForbidden`], so callers cannot probe for
/// other users' project ids.
///
/// In [`AccessMode::Write`] the project row is locked (`FOR UPDATE`) for the
/// rest of the enclosing transaction. That lock is the per-project
/// serialization point for token writes and deletes: writers to the same
/// project queue behind each other, writers to different projects do not
/// contend.
///
/// # Example
///
/// ```no_run
/// use tokenforge_shared::auth::ownership::{require_project_owner, AccessMode};
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let project = require_project_owner(&pool, project_id, user_id, AccessMode::Read).await?;
/// println!("{} is yours", project.name);
/// # Ok(())
/// # }
/// ```

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::project::Project;

/// Error type for ownership checks
#[derive(Debug, thiserror::Error)]
pub enum OwnershipError {
    /// Project is missing or belongs to another user
    #[error("Project not found")]
    NotFoundOrForbidden,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// How the caller intends to use the project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Plain read, no lock
    Read,

    /// Mutation; locks the project row until the transaction ends
    Write,
}

/// Loads a project if and only if `user_id` owns it
pub async fn require_project_owner<'e, E>(
    executor: E,
    project_id: Uuid,
    user_id: Uuid,
    mode: AccessMode,
) -> Result<Project, OwnershipError>
where
    E: PgExecutor<'e>,
{
    let query = match mode {
        AccessMode::Read => {
            "SELECT id, name, owner_id, created_at FROM projects WHERE id = $1 AND owner_id = $2"
        }
        AccessMode::Write => {
            "SELECT id, name, owner_id, created_at FROM projects WHERE id = $1 AND owner_id = $2 FOR UPDATE"
        }
    };

    sqlx::query_as::<_, Project>(query)
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?
        .ok_or(OwnershipError::NotFoundOrForbidden)
}

/// Deletes a project owned by `user_id`
///
/// Tokens and versions are removed by the store-level cascade in the same
/// statement.
pub async fn delete_owned_project(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<(), OwnershipError> {
    let mut tx = pool.begin().await?;

    require_project_owner(&mut *tx, project_id, user_id, AccessMode::Write).await?;
    Project::delete(&mut *tx, project_id).await?;

    tx.commit().await?;

    tracing::info!(%project_id, %user_id, "Project deleted");
    Ok(())
}
