/// Billing endpoints
///
/// - `POST /stripe/session` - Hosted checkout for a paid plan (session)
/// - `POST /stripe/webhook` - Payment provider events (signature)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{parse_id, ApiJson},
    providers::{CheckoutLink, CheckoutRequest},
};
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tokenforge_shared::{
    auth::middleware::AuthContext,
    billing::{
        events::parse_event,
        reconcile::reconcile,
        signature::{verify, DEFAULT_TOLERANCE_SECS},
    },
    models::user::{SubscriptionTier, User},
};

/// Signature header sent with every webhook
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Checkout request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    /// `pro` or `team`
    pub plan_id: Option<String>,

    /// Optional; must match the session user when present
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Creates a hosted checkout session
///
/// The first checkout also creates the provider customer and stores its id
/// on the user.
///
/// # Errors
///
/// - `400 Bad Request`: Unknown or free plan
/// - `404 Not Found`: `userId` names someone else, or the user is gone
/// - `500 Internal Server Error`: Billing not configured, or provider failure
pub async fn create_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CheckoutSessionRequest>,
) -> ApiResult<Json<CheckoutLink>> {
    let plan = req
        .plan_id
        .as_deref()
        .and_then(SubscriptionTier::from_str)
        .filter(SubscriptionTier::is_paid)
        .ok_or_else(|| ApiError::BadRequest("Invalid or missing plan ID.".to_string()))?;

    if let Some(raw) = req.user_id.as_deref() {
        if parse_id(raw, "user")? != auth.user_id {
            return Err(ApiError::NotFound("User not found.".to_string()));
        }
    }

    let catalog = state.config.stripe.catalog();
    let price_id = catalog
        .price_for(plan)
        .ok_or(ApiError::NotConfigured("Stripe price for this plan"))?
        .to_string();

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    let customer_id = match user.stripe_customer_id {
        Some(id) => id,
        None => {
            let created = state.billing.create_customer(&user.email, user.id).await?;
            let stored = User::claim_stripe_customer_id(&state.db, user.id, &created)
                .await?
                .and_then(|u| u.stripe_customer_id)
                .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

            if stored == created {
                tracing::info!(user_id = %user.id, customer_id = %created, "Billing customer created");
            } else {
                tracing::warn!(
                    user_id = %user.id,
                    customer_id = %stored,
                    discarded = %created,
                    "Billing customer already recorded by a concurrent checkout"
                );
            }
            stored
        }
    };

    let app_url = &state.config.api.app_url;
    let link = state
        .billing
        .create_checkout_session(&CheckoutRequest {
            customer_id,
            user_id: user.id,
            plan,
            price_id,
            success_url: format!("{}/payment/success?session_id={{CHECKOUT_SESSION_ID}}", app_url),
            cancel_url: format!("{}/payment/cancelled", app_url),
        })
        .await?;

    tracing::info!(user_id = %user.id, plan = plan.as_str(), session_id = %link.session_id, "Checkout session created");

    Ok(Json(link))
}

/// Receives payment provider events
///
/// The raw body is verified against the `Stripe-Signature` header before it
/// is parsed. Events that need no action are acknowledged.
///
/// # Errors
///
/// - `400 Bad Request`: Missing or bad signature, malformed event
/// - `500 Internal Server Error`: Webhook secret unset, or a store failure
///   (the provider retries)
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let secret = state
        .config
        .stripe
        .webhook_secret
        .as_deref()
        .ok_or(ApiError::NotConfigured("Stripe webhook secret"))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing Stripe-Signature header".to_string()))?;

    let now = chrono::Utc::now().timestamp();
    verify(&body, signature, secret, now, DEFAULT_TOLERANCE_SECS).map_err(|e| {
        tracing::warn!(error = %e, "Rejected webhook signature");
        ApiError::from(e)
    })?;

    let event = parse_event(&body)?;
    let outcome = reconcile(&state.db, &event, &state.config.stripe.catalog()).await?;

    tracing::debug!(
        event_id = %event.id,
        event_type = %event.event_type,
        outcome = ?outcome,
        "Webhook processed"
    );

    Ok(Json(WebhookAck { received: true }))
}
