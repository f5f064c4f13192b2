/// Applying billing events to users
///
/// | Event                           | Effect                                        |
/// |---------------------------------|-----------------------------------------------|
/// | `checkout.session.completed`    | record customer + subscription, set paid tier |
/// | `customer.subscription.updated` | `active`: tier from price; `canceled`, `unpaid`, `past_due`: free |
/// | `customer.subscription.deleted` | free, subscription cleared                    |
///
/// The user is matched by the `app_user_id` we attach at checkout when it is
/// present, otherwise by the provider customer id.

use sqlx::PgPool;
use uuid::Uuid;

use super::events::{BillingEvent, CheckoutSession, Event, Subscription};
use crate::models::user::{BillingSubject, SubscriptionChange, SubscriptionTier, User};

/// Metadata key carrying our user id
pub const META_USER_ID: &str = "app_user_id";

/// Metadata key carrying the purchased plan
pub const META_PLAN: &str = "app_plan_identifier";

/// Metadata key carrying the purchased price
pub const META_PRICE_ID: &str = "stripe_price_id";

/// Subscription statuses that drop the user to the free tier
const LAPSED_STATUSES: [&str; 3] = ["canceled", "unpaid", "past_due"];

/// Maps paid tiers to provider price ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceCatalog {
    pub pro: Option<String>,
    pub team: Option<String>,
}

impl PriceCatalog {
    /// Price id for a tier, if configured
    pub fn price_for(&self, tier: SubscriptionTier) -> Option<&str> {
        match tier {
            SubscriptionTier::Free => None,
            SubscriptionTier::Pro => self.pro.as_deref(),
            SubscriptionTier::Team => self.team.as_deref(),
        }
    }

    /// Tier sold at a price id
    pub fn tier_for_price(&self, price_id: &str) -> Option<SubscriptionTier> {
        if self.pro.as_deref() == Some(price_id) {
            Some(SubscriptionTier::Pro)
        } else if self.team.as_deref() == Some(price_id) {
            Some(SubscriptionTier::Team)
        } else {
            None
        }
    }
}

/// Error type for reconciliation
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Event lacks data needed to act on it
    #[error("{0}")]
    Invalid(String),

    /// Database error; the provider should retry
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// What reconciliation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A user row was updated
    Applied { user_id: Uuid, tier: SubscriptionTier },

    /// No user matched the event
    UnknownUser,

    /// Event type or status needs no action
    Ignored,
}

/// Applies one decoded event
pub async fn reconcile(
    pool: &PgPool,
    event: &Event,
    catalog: &PriceCatalog,
) -> Result<ReconcileOutcome, ReconcileError> {
    let plan = match &event.kind {
        BillingEvent::CheckoutCompleted(session) => checkout_change(session, catalog)?,
        BillingEvent::SubscriptionUpdated(sub) => match updated_change(sub, catalog)? {
            Some(plan) => plan,
            None => return Ok(ReconcileOutcome::Ignored),
        },
        BillingEvent::SubscriptionDeleted(sub) => (
            subject_for(sub)?,
            SubscriptionChange {
                tier: SubscriptionTier::Free,
                subscription_id: None,
                customer_id: None,
            },
        ),
        BillingEvent::Other => {
            tracing::debug!(event_id = %event.id, event_type = %event.event_type, "Unhandled billing event");
            return Ok(ReconcileOutcome::Ignored);
        }
    };

    let (subject, change) = plan;
    match User::apply_subscription(pool, &subject, &change).await? {
        Some(user) => {
            tracing::info!(
                event_id = %event.id,
                event_type = %event.event_type,
                user_id = %user.id,
                tier = user.tier.as_str(),
                "Subscription reconciled"
            );
            Ok(ReconcileOutcome::Applied {
                user_id: user.id,
                tier: user.tier,
            })
        }
        None => {
            tracing::warn!(
                event_id = %event.id,
                event_type = %event.event_type,
                subject = ?subject,
                "Billing event matched no user"
            );
            Ok(ReconcileOutcome::UnknownUser)
        }
    }
}

fn parse_user_id(raw: &str) -> Result<Uuid, ReconcileError> {
    Uuid::parse_str(raw).map_err(|_| ReconcileError::Invalid(format!("Invalid user identifier '{}'", raw)))
}

fn checkout_change(
    session: &CheckoutSession,
    catalog: &PriceCatalog,
) -> Result<(BillingSubject, SubscriptionChange), ReconcileError> {
    let user_id = session
        .client_reference_id
        .as_deref()
        .or_else(|| session.metadata.get(META_USER_ID).map(String::as_str))
        .ok_or_else(|| ReconcileError::Invalid("Missing user identifier in session.".to_string()))?;
    let user_id = parse_user_id(user_id)?;

    let customer_id = session
        .customer
        .as_ref()
        .map(|c| c.id().to_string())
        .ok_or_else(|| ReconcileError::Invalid("Missing customer identifier in session.".to_string()))?;

    let subscription_id = session
        .subscription
        .as_ref()
        .map(|s| s.id().to_string())
        .ok_or_else(|| {
            ReconcileError::Invalid("Missing subscription identifier in session.".to_string())
        })?;

    let tier = session
        .metadata
        .get(META_PLAN)
        .and_then(|plan| SubscriptionTier::from_str(plan))
        .filter(SubscriptionTier::is_paid)
        .or_else(|| {
            session
                .metadata
                .get(META_PRICE_ID)
                .and_then(|price| catalog.tier_for_price(price))
        })
        .ok_or_else(|| ReconcileError::Invalid("Missing plan identifier in session metadata.".to_string()))?;

    Ok((
        BillingSubject::User(user_id),
        SubscriptionChange {
            tier,
            subscription_id: Some(subscription_id),
            customer_id: Some(customer_id),
        },
    ))
}

fn subject_for(sub: &Subscription) -> Result<BillingSubject, ReconcileError> {
    if let Some(user_id) = sub.metadata.get(META_USER_ID) {
        return Ok(BillingSubject::User(parse_user_id(user_id)?));
    }

    sub.customer
        .as_ref()
        .map(|c| BillingSubject::Customer(c.id().to_string()))
        .ok_or_else(|| ReconcileError::Invalid("Missing customer identifier in subscription.".to_string()))
}

fn updated_change(
    sub: &Subscription,
    catalog: &PriceCatalog,
) -> Result<Option<(BillingSubject, SubscriptionChange)>, ReconcileError> {
    let change = if sub.status == "active" {
        let Some(tier) = sub.price_id().and_then(|price| catalog.tier_for_price(price)) else {
            tracing::warn!(
                subscription_id = %sub.id,
                price_id = ?sub.price_id(),
                "Active subscription has an unknown price; tier left unchanged"
            );
            return Ok(None);
        };
        SubscriptionChange {
            tier,
            subscription_id: Some(sub.id.clone()),
            customer_id: None,
        }
    } else if LAPSED_STATUSES.contains(&sub.status.as_str()) {
        SubscriptionChange {
            tier: SubscriptionTier::Free,
            subscription_id: None,
            customer_id: None,
        }
    } else {
        return Ok(None);
    };

    Ok(Some((subject_for(sub)?, change)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::events::parse_event;
    use serde_json::json;

    fn catalog() -> PriceCatalog {
        PriceCatalog {
            pro: Some("price_pro".to_string()),
            team: Some("price_team".to_string()),
        }
    }

    fn subscription(status: &str, price: &str, metadata: serde_json::Value) -> Subscription {
        let body = json!({
            "id": "evt",
            "type": "customer.subscription.updated",
            "data": {"object": {
                "id": "sub_1",
                "customer": "cus_1",
                "status": status,
                "metadata": metadata,
                "items": {"data": [{"price": {"id": price}}]}
            }}
        });
        match parse_event(body.to_string().as_bytes()).unwrap().kind {
            BillingEvent::SubscriptionUpdated(sub) => sub,
            other => panic!("unexpected {:?}", other),
        }
    }

    fn checkout(object: serde_json::Value) -> CheckoutSession {
        let body = json!({
            "id": "evt",
            "type": "checkout.session.completed",
            "data": {"object": object}
        });
        match parse_event(body.to_string().as_bytes()).unwrap().kind {
            BillingEvent::CheckoutCompleted(session) => session,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_price_catalog_lookup() {
        let catalog = catalog();
        assert_eq!(catalog.price_for(SubscriptionTier::Pro), Some("price_pro"));
        assert_eq!(catalog.price_for(SubscriptionTier::Free), None);
        assert_eq!(catalog.tier_for_price("price_team"), Some(SubscriptionTier::Team));
        assert_eq!(catalog.tier_for_price("price_other"), None);
    }

    #[test]
    fn test_checkout_change() {
        let user_id = Uuid::new_v4();
        let session = checkout(json!({
            "id": "cs_1",
            "client_reference_id": user_id.to_string(),
            "customer": "cus_9",
            "subscription": "sub_9",
            "metadata": {"app_plan_identifier": "team"}
        }));

        let (subject, change) = checkout_change(&session, &catalog()).unwrap();
        assert_eq!(subject, BillingSubject::User(user_id));
        assert_eq!(change.tier, SubscriptionTier::Team);
        assert_eq!(change.subscription_id.as_deref(), Some("sub_9"));
        assert_eq!(change.customer_id.as_deref(), Some("cus_9"));
    }

    #[test]
    fn test_checkout_falls_back_to_metadata_and_price() {
        let user_id = Uuid::new_v4();
        let session = checkout(json!({
            "id": "cs_1",
            "customer": "cus_9",
            "subscription": "sub_9",
            "metadata": {"app_user_id": user_id.to_string(), "stripe_price_id": "price_pro"}
        }));

        let (subject, change) = checkout_change(&session, &catalog()).unwrap();
        assert_eq!(subject, BillingSubject::User(user_id));
        assert_eq!(change.tier, SubscriptionTier::Pro);
    }

    #[test]
    fn test_checkout_requires_identifiers() {
        let session = checkout(json!({"id": "cs_1", "customer": "cus_9", "subscription": "sub_9"}));
        let err = checkout_change(&session, &catalog()).unwrap_err();
        assert_eq!(err.to_string(), "Missing user identifier in session.");

        let session = checkout(json!({
            "id": "cs_1",
            "client_reference_id": Uuid::new_v4().to_string(),
            "customer": "cus_9",
            "subscription": "sub_9",
            "metadata": {"app_plan_identifier": "free"}
        }));
        assert!(checkout_change(&session, &catalog()).is_err());
    }

    #[test]
    fn test_updated_active_sets_tier_from_price() {
        let sub = subscription("active", "price_team", json!({}));
        let (subject, change) = updated_change(&sub, &catalog()).unwrap().unwrap();

        assert_eq!(subject, BillingSubject::Customer("cus_1".to_string()));
        assert_eq!(change.tier, SubscriptionTier::Team);
        assert_eq!(change.subscription_id.as_deref(), Some("sub_1"));
    }

    #[test]
    fn test_updated_lapsed_drops_to_free() {
        for status in LAPSED_STATUSES {
            let sub = subscription(status, "price_pro", json!({}));
            let (_, change) = updated_change(&sub, &catalog()).unwrap().unwrap();
            assert_eq!(change.tier, SubscriptionTier::Free);
            assert_eq!(change.subscription_id, None);
        }
    }

    #[test]
    fn test_updated_ignores_other_statuses_and_unknown_prices() {
        let trialing = subscription("trialing", "price_pro", json!({}));
        assert!(updated_change(&trialing, &catalog()).unwrap().is_none());

        let unknown_price = subscription("active", "price_legacy", json!({}));
        assert!(updated_change(&unknown_price, &catalog()).unwrap().is_none());
    }

    #[test]
    fn test_subject_prefers_app_user_id() {
        let user_id = Uuid::new_v4();
        let sub = subscription("canceled", "price_pro", json!({"app_user_id": user_id.to_string()}));
        assert_eq!(subject_for(&sub).unwrap(), BillingSubject::User(user_id));

        let bad = subscription("canceled", "price_pro", json!({"app_user_id": "not-a-uuid"}));
        assert!(matches!(subject_for(&bad), Err(ReconcileError::Invalid(_))));
    }
}
