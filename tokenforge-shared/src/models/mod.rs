/// Database models for Tokenforge
///
/// This module contains all database models and their queries.
///
/// # Models
///
/// - `user`: Accounts created from GitHub sign-in, carrying the subscription tier
/// - `project`: Named, user-owned containers of design tokens
/// - `token`: Current value of each design token in a project
/// - `version`: Append-only full snapshots of a project's tokens
/// - `waitlist`: Pre-launch email sign-ups
///
/// # Ownership Chain
///
/// ```text
/// users ──< projects ──< tokens
///                    └─< versions
/// ```
///
/// Deleting a project cascades to its tokens and versions at the store level.
///
/// # Example
///
/// ```no_run
/// use tokenforge_shared::models::project::{CreateProject, Project};
/// use tokenforge_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(owner_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let project = Project::create(&pool, CreateProject {
///     name: "Marketing site".to_string(),
///     owner_id,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod project;
pub mod token;
pub mod user;
pub mod version;
pub mod waitlist;

/// Error returned when a stored enum column holds an unknown value
#[derive(Debug, thiserror::Error)]
#[error("Unknown {kind} value: {value}")]
pub struct UnknownVariant {
    /// Which enumeration was being decoded
    pub kind: &'static str,

    /// The offending stored value
    pub value: String,
}
