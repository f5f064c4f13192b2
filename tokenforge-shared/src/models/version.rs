/// Version model and database operations
///
/// A version is an immutable, full snapshot of a project's tokens taken right
/// after a token write. Versions are append-only: there is no update or
/// delete here, and rows only disappear when their project is deleted.
///
/// Version numbers start at 1 and increase by one per project. The next
/// number is derived from the current maximum, so appending is only safe
/// while the caller holds the project row lock taken by
/// [`crate::auth::ownership::require_project_owner`] in write mode. The
/// `UNIQUE (project_id, version_number)` constraint backs that up.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE versions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     version_number INTEGER NOT NULL,
///     snapshot JSONB NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT versions_project_number_unique UNIQUE (project_id, version_number)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgExecutor;
use uuid::Uuid;

use super::token::{Token, TokenType};

/// One token as captured in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub name: String,

    #[serde(rename = "type")]
    pub token_type: TokenType,

    pub value: JsonValue,
}

impl From<&Token> for SnapshotEntry {
    fn from(token: &Token) -> Self {
        Self {
            name: token.name.clone(),
            token_type: token.token_type,
            value: token.value.clone(),
        }
    }
}

/// Full version record, snapshot included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Version {
    /// Unique version ID
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    /// Per-project sequence number, starting at 1
    pub version_number: i32,

    /// JSON array of [`SnapshotEntry`]
    pub snapshot: JsonValue,

    /// When the version was recorded
    pub created_at: DateTime<Utc>,
}

/// Version listing row without the snapshot payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VersionSummary {
    pub id: Uuid,
    pub project_id: Uuid,
    pub version_number: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&Version> for VersionSummary {
    fn from(version: &Version) -> Self {
        Self {
            id: version.id,
            project_id: version.project_id,
            version_number: version.version_number,
            created_at: version.created_at,
        }
    }
}

impl Version {
    /// Decodes the snapshot payload into typed entries
    pub fn entries(&self) -> Result<Vec<SnapshotEntry>, serde_json::Error> {
        serde_json::from_value(self.snapshot.clone())
    }

    /// Lists a project's versions newest first, without snapshots
    pub async fn list_summaries<'e, E>(
        executor: E,
        project_id: Uuid,
    ) -> Result<Vec<VersionSummary>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, VersionSummary>(
            r#"
            SELECT id, project_id, version_number, created_at
            FROM versions
            WHERE project_id = $1
            ORDER BY version_number DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
    }

    /// Finds one version, scoped to its project
    ///
    /// A version id belonging to another project yields None.
    pub async fn find_in_project<'e, E>(
        executor: E,
        project_id: Uuid,
        version_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Version>(
            r#"
            SELECT id, project_id, version_number, snapshot, created_at
            FROM versions
            WHERE id = $1 AND project_id = $2
            "#,
        )
        .bind(version_id)
        .bind(project_id)
        .fetch_optional(executor)
        .await
    }

    /// Highest version number recorded for a project, 0 when there is none
    pub async fn latest_number<'e, E>(executor: E, project_id: Uuid) -> Result<i32, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT COALESCE(MAX(version_number), 0) FROM versions WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_one(executor)
        .await
    }

    /// Appends the next version for a project
    ///
    /// Must run inside the transaction that holds the project lock.
    pub(crate) async fn append<'e, E>(
        executor: E,
        project_id: Uuid,
        entries: &[SnapshotEntry],
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Version>(
            r#"
            INSERT INTO versions (project_id, version_number, snapshot)
            VALUES (
                $1,
                (SELECT COALESCE(MAX(version_number), 0) + 1 FROM versions WHERE project_id = $1),
                $2
            )
            RETURNING id, project_id, version_number, snapshot, created_at
            "#,
        )
        .bind(project_id)
        .bind(sqlx::types::Json(entries))
        .fetch_one(executor)
        .await
    }
}
