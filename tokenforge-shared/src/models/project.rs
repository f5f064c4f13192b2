/// Project model and database operations
///
/// A project is a named container of design tokens owned by exactly one user.
/// Reads and writes that go through a project must first pass the ownership
/// check in [`crate::auth::ownership`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Maximum project name length
pub const MAX_NAME_LEN: usize = 100;

/// Project model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Owning user
    pub owner_id: Uuid,

    /// When the project was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    /// Display name (already validated)
    pub name: String,

    /// Owning user
    pub owner_id: Uuid,
}

impl Project {
    /// Creates a new project
    pub async fn create<'e, E>(executor: E, data: CreateProject) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, owner_id)
            VALUES ($1, $2)
            RETURNING id, name, owner_id, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.owner_id)
        .fetch_one(executor)
        .await
    }

    /// Lists projects owned by a user, newest first
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, owner_id, created_at
            FROM projects
            WHERE owner_id = $1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    /// Counts projects owned by a user
    pub async fn count_by_owner<'e, E>(executor: E, owner_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(executor)
            .await?;

        Ok(count)
    }

    /// Deletes a project by ID
    ///
    /// Tokens and versions go with it through `ON DELETE CASCADE`. Callers
    /// verify ownership first; see [`crate::auth::ownership::delete_owned_project`].
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Normalizes and validates a project name
///
/// Returns the trimmed name, or a human-readable reason.
pub fn validate_name(raw: Option<&str>) -> Result<String, String> {
    let name = raw.map(str::trim).unwrap_or_default();

    if name.is_empty() {
        return Err("Project name is required".to_string());
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(format!(
            "Project name must be at most {} characters",
            MAX_NAME_LEN
        ));
    }

    Ok(name.to_string())
}
