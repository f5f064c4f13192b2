/// The token write path
///
/// Writing a token is one database transaction that:
///
/// 1. locks the project row, failing unless the caller owns the project
/// 2. checks the owner's token limit when the name is new
/// 3. inserts the token, or updates it when the name already exists
/// 4. reads back every token in the project
/// 5. appends a version holding that full snapshot, numbered one past the
///    project's current maximum
///
/// Either all of it commits or none of it does. The row lock from step 1
/// makes concurrent writers to the same project run one after the other, so
/// version numbers come out as `1..N` with no duplicates and every snapshot
/// contains every write committed before it. Writers to different projects
/// take different locks and proceed in parallel.
///
/// This module is the only code that inserts tokens or versions.
///
/// # Example
///
/// ```no_run
/// use tokenforge_shared::versioning::{write_token, TokenWrite};
/// use tokenforge_shared::models::token::TokenType;
/// use serde_json::json;
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid, project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let write = TokenWrite::new("color/primary", TokenType::Color, json!("#FF0000"));
/// let outcome = write_token(&pool, user_id, project_id, write).await?;
///
/// println!("{} is now at version {}", outcome.token.name, outcome.version.version_number);
/// # Ok(())
/// # }
/// ```

use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::ownership::{require_project_owner, AccessMode, OwnershipError};
use crate::models::token::{Token, TokenType};
use crate::models::user::User;
use crate::models::version::{SnapshotEntry, Version, VersionSummary};
use crate::quota::{ensure_room, QuotaError, QuotaKind};

/// Maximum token name length
pub const MAX_TOKEN_NAME_LEN: usize = 255;

/// One invalid input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Error type for the token write path
#[derive(Debug, thiserror::Error)]
pub enum VersioningError {
    /// Input rejected before touching the database
    #[error("Invalid token: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    /// Project is missing or belongs to another user
    #[error("Project not found")]
    NotFoundOrForbidden,

    /// The owner's plan has no room for another token
    #[error("{0}")]
    QuotaExceeded(QuotaError),

    /// Any store failure; the transaction was rolled back
    #[error("token/version write failed")]
    OperationFailed(#[source] sqlx::Error),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<sqlx::Error> for VersioningError {
    fn from(err: sqlx::Error) -> Self {
        VersioningError::OperationFailed(err)
    }
}

impl From<OwnershipError> for VersioningError {
    fn from(err: OwnershipError) -> Self {
        match err {
            OwnershipError::NotFoundOrForbidden => VersioningError::NotFoundOrForbidden,
            OwnershipError::Database(e) => VersioningError::OperationFailed(e),
        }
    }
}

impl From<QuotaError> for VersioningError {
    fn from(err: QuotaError) -> Self {
        match err {
            QuotaError::DatabaseError(e) => VersioningError::OperationFailed(e),
            other => VersioningError::QuotaExceeded(other),
        }
    }
}

/// A validated token write
#[derive(Debug, Clone, PartialEq)]
pub struct TokenWrite {
    pub name: String,
    pub token_type: TokenType,
    pub value: JsonValue,
}

impl TokenWrite {
    /// Builds a write from already-typed parts
    pub fn new(name: impl Into<String>, token_type: TokenType, value: JsonValue) -> Self {
        Self {
            name: name.into(),
            token_type,
            value,
        }
    }

    /// Validates raw request fields
    ///
    /// `name` is trimmed and must be non-empty. `type` must be one of the
    /// known token types. `value` must be present and not null or a blank
    /// string; numbers (including 0), booleans and structured values pass.
    pub fn from_parts(
        name: Option<String>,
        token_type: Option<String>,
        value: Option<JsonValue>,
    ) -> Result<Self, VersioningError> {
        let mut errors = Vec::new();

        let name = name.map(|n| n.trim().to_string()).unwrap_or_default();
        if name.is_empty() {
            errors.push(FieldError::new("name", "name is required"));
        } else if name.chars().count() > MAX_TOKEN_NAME_LEN {
            errors.push(FieldError::new(
                "name",
                format!("name must be at most {} characters", MAX_TOKEN_NAME_LEN),
            ));
        }

        let parsed_type = match token_type.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push(FieldError::new("type", "type is required"));
                None
            }
            Some(raw) => {
                let parsed = TokenType::from_str(raw);
                if parsed.is_none() {
                    errors.push(FieldError::new("type", format!("unknown token type '{}'", raw)));
                }
                parsed
            }
        };

        let value = match value {
            None | Some(JsonValue::Null) => {
                errors.push(FieldError::new("value", "value is required"));
                None
            }
            Some(JsonValue::String(s)) if s.trim().is_empty() => {
                errors.push(FieldError::new("value", "value is required"));
                None
            }
            Some(v) => Some(v),
        };

        match (parsed_type, value) {
            (Some(token_type), Some(value)) if errors.is_empty() => Ok(Self {
                name,
                token_type,
                value,
            }),
            _ => Err(VersioningError::Validation(errors)),
        }
    }
}

/// What a successful write produced
#[derive(Debug, Clone, Serialize)]
pub struct WriteOutcome {
    /// The token as stored
    pub token: Token,

    /// The version appended by this write
    pub version: VersionSummary,
}

/// Writes a token and appends a version snapshot, atomically
pub async fn write_token(
    pool: &PgPool,
    user_id: Uuid,
    project_id: Uuid,
    write: TokenWrite,
) -> Result<WriteOutcome, VersioningError> {
    let mut tx = pool.begin().await?;

    require_project_owner(&mut *tx, project_id, user_id, AccessMode::Write).await?;

    if !Token::exists(&mut *tx, project_id, &write.name).await? {
        let tier = User::find_by_id(&mut *tx, user_id)
            .await?
            .map(|u| u.tier)
            .ok_or(VersioningError::NotFoundOrForbidden)?;
        let current = Token::count_by_project(&mut *tx, project_id).await?;
        ensure_room(tier, QuotaKind::TokensPerProject, current)?;
    }

    let token = Token::upsert(
        &mut *tx,
        project_id,
        &write.name,
        write.token_type,
        &write.value,
    )
    .await?;

    let tokens = Token::list_by_project(&mut *tx, project_id).await?;
    let entries: Vec<SnapshotEntry> = tokens.iter().map(SnapshotEntry::from).collect();

    let version = Version::append(&mut *tx, project_id, &entries).await?;

    tx.commit().await?;

    tracing::info!(
        %project_id,
        %user_id,
        token = %token.name,
        version_number = version.version_number,
        snapshot_size = entries.len(),
        "Token written"
    );

    Ok(WriteOutcome {
        token,
        version: VersionSummary::from(&version),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_parts_valid() {
        let write = TokenWrite::from_parts(
            Some("  color/primary ".to_string()),
            Some("color".to_string()),
            Some(json!("#FF0000")),
        )
        .unwrap();

        assert_eq!(write, TokenWrite::new("color/primary", TokenType::Color, json!("#FF0000")));
    }

    #[test]
    fn test_from_parts_accepts_zero_and_structured_values() {
        assert!(TokenWrite::from_parts(
            Some("spacing/none".to_string()),
            Some("spacing".to_string()),
            Some(json!(0)),
        )
        .is_ok());

        assert!(TokenWrite::from_parts(
            Some("type/body".to_string()),
            Some("typography".to_string()),
            Some(json!({"fontFamily": "Inter", "fontSize": 16})),
        )
        .is_ok());
    }

    #[test]
    fn test_from_parts_reports_every_missing_field() {
        let err = TokenWrite::from_parts(None, None, None).unwrap_err();

        match err {
            VersioningError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["name", "type", "value"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_parts_rejects_null_and_blank_values() {
        for value in [json!(null), json!(""), json!("   ")] {
            let result = TokenWrite::from_parts(
                Some("color/primary".to_string()),
                Some("color".to_string()),
                Some(value),
            );
            assert!(matches!(result, Err(VersioningError::Validation(_))));
        }
    }

    #[test]
    fn test_from_parts_rejects_unknown_type() {
        let err = TokenWrite::from_parts(
            Some("shadow/lg".to_string()),
            Some("shadow".to_string()),
            Some(json!("0 4px 8px black")),
        )
        .unwrap_err();

        assert!(err.to_string().contains("unknown token type 'shadow'"));
    }

    #[test]
    fn test_from_parts_rejects_long_name() {
        let result = TokenWrite::from_parts(
            Some("a".repeat(MAX_TOKEN_NAME_LEN + 1)),
            Some("other".to_string()),
            Some(json!(1)),
        );
        assert!(matches!(result, Err(VersioningError::Validation(_))));
    }

    #[test]
    fn test_operation_failed_hides_cause() {
        let err = VersioningError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.to_string(), "token/version write failed");
    }

    #[test]
    fn test_ownership_errors_map() {
        assert!(matches!(
            VersioningError::from(OwnershipError::NotFoundOrForbidden),
            VersioningError::NotFoundOrForbidden
        ));
        assert!(matches!(
            VersioningError::from(OwnershipError::Database(sqlx::Error::PoolTimedOut)),
            VersioningError::OperationFailed(_)
        ));
    }
}
