/// User model and database operations
///
/// Users are created on their first successful GitHub sign-in and are keyed by
/// the GitHub account id from then on. Billing events move the subscription
/// tier and record the payment provider's customer/subscription ids.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(320) NOT NULL,
///     tier VARCHAR(20) NOT NULL DEFAULT 'free',
///     github_id VARCHAR(64) UNIQUE,
///     stripe_customer_id VARCHAR(255) UNIQUE,
///     stripe_subscription_id VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use tokenforge_shared::models::user::User;
/// use tokenforge_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// // First login creates the row, later logins refresh the email
/// let user = User::upsert_github(&pool, "583231", "octocat@github.com").await?;
/// println!("Signed in as {} on the {} plan", user.email, user.tier.as_str());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::UnknownVariant;

/// Subscription tier
///
/// A closed set, independent of any access-control role. Every new user
/// starts on `Free`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    /// Free plan (1 project, 50 tokens)
    Free,

    /// Pro plan (5 projects, 500 tokens per project)
    Pro,

    /// Team plan (unlimited)
    Team,
}

impl SubscriptionTier {
    /// Converts tier to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Pro => "pro",
            SubscriptionTier::Team => "team",
        }
    }

    /// Parses tier from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "free" => Some(SubscriptionTier::Free),
            "pro" => Some(SubscriptionTier::Pro),
            "team" => Some(SubscriptionTier::Team),
            _ => None,
        }
    }

    /// Whether this tier can be bought through checkout
    pub fn is_paid(&self) -> bool {
        !matches!(self, SubscriptionTier::Free)
    }
}

impl TryFrom<String> for SubscriptionTier {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value).ok_or(UnknownVariant {
            kind: "subscription tier",
            value,
        })
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Primary email as reported by the identity provider
    pub email: String,

    /// Current subscription tier
    #[sqlx(try_from = "String")]
    pub tier: SubscriptionTier,

    /// GitHub account id
    pub github_id: Option<String>,

    /// Payment provider customer id, set on first checkout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,

    /// Active subscription id, cleared when the subscription ends
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_subscription_id: Option<String>,

    /// When the user was created
    pub created_at: DateTime<Utc>,

    /// When the user was last updated
    pub updated_at: DateTime<Utc>,
}

/// Which user a billing change applies to
///
/// Checkout events carry our own user id; later subscription events may only
/// carry the provider's customer id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingSubject {
    /// Our user id, from checkout metadata
    User(Uuid),

    /// The payment provider's customer id
    Customer(String),
}

/// A change to a user's subscription state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionChange {
    /// New tier
    pub tier: SubscriptionTier,

    /// New subscription id (None clears it)
    pub subscription_id: Option<String>,

    /// Customer id to record (None keeps the stored one)
    pub customer_id: Option<String>,
}

const COLUMNS: &str = "id, email, tier, github_id, stripe_customer_id, \
    stripe_subscription_id, created_at, updated_at";

impl User {
    /// Finds a user by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Finds a user by GitHub account id
    pub async fn find_by_github_id(
        pool: &PgPool,
        github_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE github_id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(github_id)
            .fetch_optional(pool)
            .await
    }

    /// Creates or refreshes the user for a GitHub identity
    ///
    /// A new user starts on the free tier. An existing user keeps its tier and
    /// billing ids; only the email is refreshed.
    pub async fn upsert_github(
        pool: &PgPool,
        github_id: &str,
        email: &str,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (github_id, email)
             VALUES ($1, $2)
             ON CONFLICT (github_id)
             DO UPDATE SET email = EXCLUDED.email, updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(github_id)
            .bind(email)
            .fetch_one(pool)
            .await
    }

    /// Records the payment provider customer id unless one is already stored
    ///
    /// The returned user carries whichever id won. Concurrent callers
    /// serialize on the row, so every one of them sees the first id.
    pub async fn claim_stripe_customer_id(
        pool: &PgPool,
        id: Uuid,
        customer_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                stripe_customer_id = COALESCE(stripe_customer_id, $2),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(customer_id)
            .fetch_optional(pool)
            .await
    }

    /// Applies a subscription change
    ///
    /// Returns the updated user, or None when no user matches the subject.
    pub async fn apply_subscription(
        pool: &PgPool,
        subject: &BillingSubject,
        change: &SubscriptionChange,
    ) -> Result<Option<Self>, sqlx::Error> {
        let (user_id, customer) = match subject {
            BillingSubject::User(id) => (Some(*id), None),
            BillingSubject::Customer(customer) => (None, Some(customer.as_str())),
        };

        let query = format!(
            "UPDATE users SET
                tier = $1,
                stripe_subscription_id = $2,
                stripe_customer_id = COALESCE($3, stripe_customer_id),
                updated_at = NOW()
             WHERE ($4::uuid IS NOT NULL AND id = $4)
                OR ($5::text IS NOT NULL AND stripe_customer_id = $5)
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(change.tier.as_str())
            .bind(change.subscription_id.as_deref())
            .bind(change.customer_id.as_deref())
            .bind(user_id)
            .bind(customer)
            .fetch_optional(pool)
            .await
    }
}
