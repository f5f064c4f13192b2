/// Plan limits per subscription tier
///
/// Limits are enforced on:
/// - Projects owned by a user
/// - Tokens in a single project
///
/// # Limits by Tier
///
/// **Free:**
/// - Projects: 1
/// - Tokens per project: 50
///
/// **Pro:**
/// - Projects: 5
/// - Tokens per project: 500
///
/// **Team:**
/// - Unlimited
///
/// Every check reads the tier from the database under a row lock, inside the
/// same transaction as the insert it guards. The tier claim in a session
/// credential can be stale after a billing change and is never used here.
///
/// # Example
///
/// ```no_run
/// use tokenforge_shared::quota::create_project_within_quota;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let project = create_project_within_quota(&pool, owner_id, "Marketing site").await?;
/// println!("Created {}", project.id);
/// # Ok(())
/// # }
/// ```

use crate::models::project::{CreateProject, Project};
use crate::models::user::SubscriptionTier;
use sqlx::{PgConnection, PgPool};
use std::fmt;
use uuid::Uuid;

/// Quota enforcement error
#[derive(Debug)]
pub enum QuotaError {
    /// Quota limit exceeded
    LimitExceeded {
        kind: QuotaKind,
        tier: SubscriptionTier,
        limit: u32,
    },

    /// Database error
    DatabaseError(sqlx::Error),

    /// User not found
    UserNotFound(Uuid),
}

impl fmt::Display for QuotaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaError::LimitExceeded { kind, tier, limit } => write!(
                f,
                "{} limit reached for the {} plan ({}). Upgrade to add more.",
                kind.as_str(),
                tier.as_str(),
                limit
            ),
            QuotaError::DatabaseError(err) => write!(f, "Database error: {}", err),
            QuotaError::UserNotFound(id) => write!(f, "User not found: {}", id),
        }
    }
}

impl std::error::Error for QuotaError {}

impl From<sqlx::Error> for QuotaError {
    fn from(err: sqlx::Error) -> Self {
        QuotaError::DatabaseError(err)
    }
}

/// Resource a limit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaKind {
    /// Projects owned by one user
    Projects,

    /// Tokens in one project
    TokensPerProject,
}

impl QuotaKind {
    /// Human-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaKind::Projects => "Project",
            QuotaKind::TokensPerProject => "Token",
        }
    }
}

/// Limits for one tier; `None` means unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    pub projects: Option<u32>,
    pub tokens_per_project: Option<u32>,
}

impl PlanLimits {
    /// Gets limits for a subscription tier
    pub fn for_tier(tier: SubscriptionTier) -> Self {
        match tier {
            SubscriptionTier::Free => PlanLimits {
                projects: Some(1),
                tokens_per_project: Some(50),
            },
            SubscriptionTier::Pro => PlanLimits {
                projects: Some(5),
                tokens_per_project: Some(500),
            },
            SubscriptionTier::Team => PlanLimits {
                projects: None,
                tokens_per_project: None,
            },
        }
    }

    /// Gets limit for a specific resource
    pub fn get(&self, kind: QuotaKind) -> Option<u32> {
        match kind {
            QuotaKind::Projects => self.projects,
            QuotaKind::TokensPerProject => self.tokens_per_project,
        }
    }
}

/// Fails when adding one more `kind` to `current` would pass the tier's limit
pub fn ensure_room(tier: SubscriptionTier, kind: QuotaKind, current: i64) -> Result<(), QuotaError> {
    match PlanLimits::for_tier(tier).get(kind) {
        Some(limit) if current >= i64::from(limit) => {
            Err(QuotaError::LimitExceeded { kind, tier, limit })
        }
        _ => Ok(()),
    }
}

/// Reads a user's tier and locks the user row until the transaction ends
pub(crate) async fn lock_user_tier(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Option<SubscriptionTier>, sqlx::Error> {
    let tier: Option<String> = sqlx::query_scalar("SELECT tier FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    tier.map(SubscriptionTier::try_from)
        .transpose()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// Creates a project if the owner's plan has room for it
///
/// The owner's row is locked while counting, so two concurrent creates cannot
/// both slip under the limit.
pub async fn create_project_within_quota(
    pool: &PgPool,
    owner_id: Uuid,
    name: &str,
) -> Result<Project, QuotaError> {
    let mut tx = pool.begin().await?;

    let tier = lock_user_tier(&mut *tx, owner_id)
        .await?
        .ok_or(QuotaError::UserNotFound(owner_id))?;

    let current = Project::count_by_owner(&mut *tx, owner_id).await?;
    ensure_room(tier, QuotaKind::Projects, current)?;

    let project = Project::create(
        &mut *tx,
        CreateProject {
            name: name.to_string(),
            owner_id,
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(project_id = %project.id, %owner_id, "Project created");
    Ok(project)
}
