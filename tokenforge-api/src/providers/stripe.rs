/// Stripe REST client
///
/// Form-encoded requests authenticated with the secret key. Only customer and
/// checkout session creation are needed; webhooks are handled in
/// `tokenforge_shared::billing`.

use super::{BillingProvider, CheckoutLink, CheckoutRequest, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokenforge_shared::billing::reconcile::{META_PLAN, META_PRICE_ID, META_USER_ID};
use uuid::Uuid;

const API_URL: &str = "https://api.stripe.com/v1";

/// Stripe client; the secret key may be absent
#[derive(Clone)]
pub struct StripeClient {
    http: Client,
    secret_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl StripeClient {
    pub fn new(secret_key: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, secret_key })
    }

    pub fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }

    async fn post_form(&self, path: &str, form: &[(String, String)]) -> Result<Created, ProviderError> {
        let key = self
            .secret_key
            .as_ref()
            .ok_or(ProviderError::NotConfigured("Stripe billing"))?;

        let response = self
            .http
            .post(format!("{}{}", API_URL, path))
            .basic_auth(key, None::<&str>)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| format!("status {}", status.as_u16()));
            return Err(ProviderError::Upstream(format!("Stripe error: {}", message)));
        }

        serde_json::from_slice(&body)
            .map_err(|e| ProviderError::Upstream(format!("Unexpected Stripe response: {}", e)))
    }
}

fn pair(key: &str, value: impl Into<String>) -> (String, String) {
    (key.to_string(), value.into())
}

/// Form body for a subscription checkout session
pub(crate) fn checkout_form(request: &CheckoutRequest) -> Vec<(String, String)> {
    let user_id = request.user_id.to_string();

    vec![
        pair("mode", "subscription"),
        pair("payment_method_types[0]", "card"),
        pair("line_items[0][price]", request.price_id.as_str()),
        pair("line_items[0][quantity]", "1"),
        pair("customer", request.customer_id.as_str()),
        pair("client_reference_id", user_id.as_str()),
        pair(&format!("metadata[{}]", META_USER_ID), user_id.as_str()),
        pair(&format!("metadata[{}]", META_PRICE_ID), request.price_id.as_str()),
        pair(&format!("metadata[{}]", META_PLAN), request.plan.as_str()),
        pair("success_url", request.success_url.as_str()),
        pair("cancel_url", request.cancel_url.as_str()),
    ]
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn create_customer(&self, email: &str, user_id: Uuid) -> Result<String, ProviderError> {
        let form = vec![
            pair("email", email),
            pair(&format!("metadata[{}]", META_USER_ID), user_id.to_string()),
        ];
        Ok(self.post_form("/customers", &form).await?.id)
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutLink, ProviderError> {
        let created = self
            .post_form("/checkout/sessions", &checkout_form(request))
            .await?;

        let url = created
            .url
            .ok_or_else(|| ProviderError::Upstream("Failed to create Stripe session.".to_string()))?;

        Ok(CheckoutLink {
            session_id: created.id,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenforge_shared::models::user::SubscriptionTier;

    #[test]
    fn test_checkout_form_carries_metadata() {
        let user_id = Uuid::new_v4();
        let request = CheckoutRequest {
            customer_id: "cus_1".to_string(),
            user_id,
            plan: SubscriptionTier::Team,
            price_id: "price_team".to_string(),
            success_url: "https://app.example/payment/success".to_string(),
            cancel_url: "https://app.example/payment/cancelled".to_string(),
        };

        let form = checkout_form(&request);
        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("mode"), Some("subscription"));
        assert_eq!(get("customer"), Some("cus_1"));
        assert_eq!(get("line_items[0][price]"), Some("price_team"));
        assert_eq!(get("client_reference_id"), Some(user_id.to_string().as_str()));
        assert_eq!(get("metadata[app_user_id]"), Some(user_id.to_string().as_str()));
        assert_eq!(get("metadata[app_plan_identifier]"), Some("team"));
        assert_eq!(get("metadata[stripe_price_id]"), Some("price_team"));
    }

    #[tokio::test]
    async fn test_unconfigured_client() {
        let client = StripeClient::new(None, Duration::from_secs(1)).unwrap();
        assert!(!client.is_configured());
        assert!(matches!(
            client.create_customer("a@example.com", Uuid::new_v4()).await,
            Err(ProviderError::NotConfigured(_))
        ));
    }
}
