/// Design token model and database operations
///
/// A token row holds the *current* value of one named design value in a
/// project. Names are unique within a project (`color/primary`,
/// `spacing/md`, ...). History is not kept here; every write also appends a
/// full snapshot to `versions` through [`crate::versioning::write_token`],
/// which is the only code path that mutates this table.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     token_type VARCHAR(32) NOT NULL,
///     value JSONB NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT tokens_project_name_unique UNIQUE (project_id, name)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgExecutor;
use uuid::Uuid;

use super::UnknownVariant;

/// Kind of design value a token holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    Color,
    Spacing,
    Typography,
    FontFamily,
    FontWeight,
    FontSize,
    LineHeight,
    LetterSpacing,
    Other,
}

impl TokenType {
    /// All token types, in declaration order
    pub const ALL: [TokenType; 9] = [
        TokenType::Color,
        TokenType::Spacing,
        TokenType::Typography,
        TokenType::FontFamily,
        TokenType::FontWeight,
        TokenType::FontSize,
        TokenType::LineHeight,
        TokenType::LetterSpacing,
        TokenType::Other,
    ];

    /// Converts type to string for database storage and the wire format
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Color => "color",
            TokenType::Spacing => "spacing",
            TokenType::Typography => "typography",
            TokenType::FontFamily => "fontFamily",
            TokenType::FontWeight => "fontWeight",
            TokenType::FontSize => "fontSize",
            TokenType::LineHeight => "lineHeight",
            TokenType::LetterSpacing => "letterSpacing",
            TokenType::Other => "other",
        }
    }

    /// Parses type from string
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl TryFrom<String> for TokenType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value).ok_or(UnknownVariant {
            kind: "token type",
            value,
        })
    }
}

/// Token model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Token {
    /// Unique token ID
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    /// Token name, unique within the project
    pub name: String,

    /// Kind of value
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub token_type: TokenType,

    /// The value (string, number or structured payload depending on type)
    pub value: JsonValue,

    /// When the token was first written
    pub created_at: DateTime<Utc>,

    /// When the token was last written
    pub updated_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, project_id, name, token_type, value, created_at, updated_at";

impl Token {
    /// Lists every token in a project, ordered by name
    pub async fn list_by_project<'e, E>(
        executor: E,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM tokens WHERE project_id = $1 ORDER BY name, id"
        );
        sqlx::query_as::<_, Token>(&query)
            .bind(project_id)
            .fetch_all(executor)
            .await
    }

    /// Counts tokens in a project
    pub async fn count_by_project<'e, E>(executor: E, project_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tokens WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(executor)
            .await?;

        Ok(count)
    }

    /// Whether a token with this name already exists in the project
    pub async fn exists<'e, E>(executor: E, project_id: Uuid, name: &str) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM tokens WHERE project_id = $1 AND name = $2)",
        )
        .bind(project_id)
        .bind(name)
        .fetch_one(executor)
        .await
    }

    /// Inserts the token, or updates type and value when the name exists
    ///
    /// Crate-private: writes must go through the versioning transaction so a
    /// snapshot is always appended alongside.
    pub(crate) async fn upsert<'e, E>(
        executor: E,
        project_id: Uuid,
        name: &str,
        token_type: TokenType,
        value: &JsonValue,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO tokens (project_id, name, token_type, value)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (project_id, name)
             DO UPDATE SET token_type = EXCLUDED.token_type,
                           value = EXCLUDED.value,
                           updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Token>(&query)
            .bind(project_id)
            .bind(name)
            .bind(token_type.as_str())
            .bind(value)
            .fetch_one(executor)
            .await
    }
}
