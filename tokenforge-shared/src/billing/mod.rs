/// Subscription billing
///
/// # Modules
///
/// - [`signature`]: Webhook signature verification (HMAC-SHA256, replay window)
/// - [`events`]: Typed decoding of the webhook events we act on
/// - [`reconcile`]: Applying those events to user tier and subscription ids
///
/// # Example
///
/// ```no_run
/// use tokenforge_shared::billing::{events, reconcile, signature};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, body: &[u8], header: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let now = chrono::Utc::now().timestamp();
/// signature::verify(body, header, "whsec_...", now, signature::DEFAULT_TOLERANCE_SECS)?;
///
/// let event = events::parse_event(body)?;
/// let catalog = reconcile::PriceCatalog::default();
/// reconcile::reconcile(&pool, &event, &catalog).await?;
/// # Ok(())
/// # }
/// ```

pub mod events;
pub mod reconcile;
pub mod signature;
