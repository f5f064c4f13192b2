/// Authentication and authorization
///
/// # Modules
///
/// - [`jwt`]: Session credential (JWT) issue and validation
/// - [`middleware`]: Bearer credential extraction for Axum, `AuthContext`
/// - [`ownership`]: The single project ownership check used by every
///   project, token and version operation
///
/// # Example
///
/// ```no_run
/// use tokenforge_shared::auth::jwt::{create_token, Claims};
/// use tokenforge_shared::models::user::SubscriptionTier;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = Claims::new(
///     Uuid::new_v4(),
///     "dev@example.com".to_string(),
///     SubscriptionTier::Free,
///     None,
///     Duration::days(7),
/// );
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod ownership;
