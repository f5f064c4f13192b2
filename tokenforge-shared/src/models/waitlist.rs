/// Waitlist entries collected before launch
///
/// # Schema
///
/// ```sql
/// CREATE TABLE waitlist_entries (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(320) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT waitlist_entries_email_unique UNIQUE (email)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Waitlist entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a join attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Email was added
    Joined,

    /// Email was already on the list
    AlreadyListed,
}

impl WaitlistEntry {
    /// Adds an email to the waitlist
    ///
    /// Emails are stored lowercased. Joining twice is not an error.
    pub async fn join(pool: &PgPool, email: &str) -> Result<JoinOutcome, sqlx::Error> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO waitlist_entries (email)
            VALUES ($1)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(normalize_email(email))
        .execute(pool)
        .await?;

        if inserted.rows_affected() > 0 {
            Ok(JoinOutcome::Joined)
        } else {
            Ok(JoinOutcome::AlreadyListed)
        }
    }

    /// Finds an entry by email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WaitlistEntry>(
            "SELECT id, email, created_at FROM waitlist_entries WHERE email = $1",
        )
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }
}
