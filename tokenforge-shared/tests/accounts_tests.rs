//! Integration tests for users, billing reconciliation and the waitlist
//!
//! Requires PostgreSQL; see `tests/common/mod.rs`.

mod common;

use common::{create_user, test_pool};
use serde_json::json;
use tokenforge_shared::billing::events::parse_event;
use tokenforge_shared::billing::reconcile::{reconcile, PriceCatalog, ReconcileOutcome};
use tokenforge_shared::models::user::{SubscriptionTier, User};
use tokenforge_shared::models::waitlist::{JoinOutcome, WaitlistEntry};
use uuid::Uuid;

fn catalog() -> PriceCatalog {
    PriceCatalog {
        pro: Some("price_pro".to_string()),
        team: Some("price_team".to_string()),
    }
}

fn event(event_type: &str, object: serde_json::Value) -> Vec<u8> {
    json!({"id": format!("evt_{}", Uuid::new_v4()), "type": event_type, "data": {"object": object}})
        .to_string()
        .into_bytes()
}

#[tokio::test]
async fn test_upsert_github_keeps_tier_and_refreshes_email() {
    let Some(pool) = test_pool().await else { return };
    let github_id = format!("gh-{}", Uuid::new_v4());

    let first = User::upsert_github(&pool, &github_id, "old@example.com").await.unwrap();
    assert_eq!(first.tier, SubscriptionTier::Free);

    sqlx::query("UPDATE users SET tier = 'pro' WHERE id = $1")
        .bind(first.id)
        .execute(&pool)
        .await
        .unwrap();

    let second = User::upsert_github(&pool, &github_id, "new@example.com").await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.email, "new@example.com");
    assert_eq!(second.tier, SubscriptionTier::Pro);

    let found = User::find_by_github_id(&pool, &github_id).await.unwrap().unwrap();
    assert_eq!(found.id, first.id);
}

#[tokio::test]
async fn test_first_customer_id_is_kept() {
    let Some(pool) = test_pool().await else { return };
    let user = create_user(&pool, SubscriptionTier::Free).await;
    let first = format!("cus_{}", Uuid::new_v4().simple());
    let second = format!("cus_{}", Uuid::new_v4().simple());

    let (a, b) = tokio::join!(
        User::claim_stripe_customer_id(&pool, user.id, &first),
        User::claim_stripe_customer_id(&pool, user.id, &second),
    );
    let a = a.unwrap().unwrap().stripe_customer_id.unwrap();
    let b = b.unwrap().unwrap().stripe_customer_id.unwrap();
    assert_eq!(a, b);
    assert!(a == first || a == second);

    let later = format!("cus_{}", Uuid::new_v4().simple());
    let kept = User::claim_stripe_customer_id(&pool, user.id, &later)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.stripe_customer_id.as_deref(), Some(a.as_str()));

    assert!(User::claim_stripe_customer_id(&pool, Uuid::new_v4(), &later)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_subscription_lifecycle() {
    let Some(pool) = test_pool().await else { return };
    let user = create_user(&pool, SubscriptionTier::Free).await;
    let customer = format!("cus_{}", Uuid::new_v4().simple());

    // Checkout completes: customer and subscription recorded, tier raised
    let completed = parse_event(&event(
        "checkout.session.completed",
        json!({
            "id": "cs_1",
            "client_reference_id": user.id.to_string(),
            "customer": customer,
            "subscription": "sub_1",
            "metadata": {"app_user_id": user.id.to_string(), "app_plan_identifier": "pro"}
        }),
    ))
    .unwrap();
    let outcome = reconcile(&pool, &completed, &catalog()).await.unwrap();
    assert_eq!(
        outcome,
        ReconcileOutcome::Applied { user_id: user.id, tier: SubscriptionTier::Pro }
    );

    let stored = User::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(stored.stripe_customer_id.as_deref(), Some(customer.as_str()));
    assert_eq!(stored.stripe_subscription_id.as_deref(), Some("sub_1"));

    // Upgrade found by customer id only
    let upgraded = parse_event(&event(
        "customer.subscription.updated",
        json!({
            "id": "sub_1",
            "customer": customer,
            "status": "active",
            "items": {"data": [{"price": {"id": "price_team"}}]}
        }),
    ))
    .unwrap();
    reconcile(&pool, &upgraded, &catalog()).await.unwrap();
    let stored = User::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(stored.tier, SubscriptionTier::Team);

    // Deleted: back to free, subscription cleared, customer kept
    let deleted = parse_event(&event(
        "customer.subscription.deleted",
        json!({"id": "sub_1", "customer": customer, "status": "canceled"}),
    ))
    .unwrap();
    reconcile(&pool, &deleted, &catalog()).await.unwrap();
    let stored = User::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(stored.tier, SubscriptionTier::Free);
    assert_eq!(stored.stripe_subscription_id, None);
    assert_eq!(stored.stripe_customer_id.as_deref(), Some(customer.as_str()));
}

#[tokio::test]
async fn test_event_for_unknown_customer_is_acknowledged() {
    let Some(pool) = test_pool().await else { return };

    let deleted = parse_event(&event(
        "customer.subscription.deleted",
        json!({"id": "sub_x", "customer": format!("cus_{}", Uuid::new_v4().simple()), "status": "canceled"}),
    ))
    .unwrap();

    let outcome = reconcile(&pool, &deleted, &catalog()).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::UnknownUser);
}

#[tokio::test]
async fn test_waitlist_join_is_idempotent() {
    let Some(pool) = test_pool().await else { return };
    let email = format!("{}@Example.com", Uuid::new_v4().simple());

    assert_eq!(WaitlistEntry::join(&pool, &email).await.unwrap(), JoinOutcome::Joined);
    assert_eq!(
        WaitlistEntry::join(&pool, &email.to_uppercase()).await.unwrap(),
        JoinOutcome::AlreadyListed
    );

    let entry = WaitlistEntry::find_by_email(&pool, &email).await.unwrap().unwrap();
    assert_eq!(entry.email, email.to_lowercase());
}
