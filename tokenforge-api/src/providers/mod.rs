/// Outbound provider clients
///
/// Handlers talk to the identity and payment providers through the traits
/// below, so tests can swap in fakes.
///
/// - [`github`]: OAuth code exchange and profile lookup
/// - [`stripe`]: Customer and checkout session creation

pub mod github;
pub mod stripe;

use async_trait::async_trait;
use serde::Serialize;
use tokenforge_shared::models::user::SubscriptionTier;
use uuid::Uuid;

pub use github::GitHubClient;
pub use stripe::StripeClient;

/// Error type for provider calls
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider refused the caller's input (e.g. a stale OAuth code)
    #[error("{0}")]
    Rejected(String),

    /// Transport failure or unexpected upstream response
    #[error("{0}")]
    Upstream(String),

    /// Credentials are missing from configuration
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Upstream(format!("Provider request timed out: {}", err))
        } else {
            ProviderError::Upstream(format!("Provider request failed: {}", err))
        }
    }
}

/// One address from the identity provider's email list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct VerifiedEmail {
    pub email: String,

    #[serde(default)]
    pub primary: bool,

    #[serde(default)]
    pub verified: bool,
}

/// Identity resolved from an OAuth code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubIdentity {
    /// Numeric account id, as a string
    pub id: String,

    pub login: String,

    /// Public profile email, if set
    pub profile_email: Option<String>,

    /// Addresses from the email endpoint; may be empty
    pub emails: Vec<VerifiedEmail>,
}

impl GitHubIdentity {
    /// Email to store for this identity
    ///
    /// Primary address first, then the profile email, then the noreply alias.
    pub fn choose_email(&self) -> String {
        self.emails
            .iter()
            .find(|e| e.primary)
            .map(|e| e.email.clone())
            .or_else(|| self.profile_email.clone().filter(|e| !e.is_empty()))
            .unwrap_or_else(|| format!("{}+{}@users.noreply.github.com", self.id, self.login))
    }
}

/// Exchanges OAuth codes for identities
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<GitHubIdentity, ProviderError>;
}

/// Input for a hosted subscription checkout
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub customer_id: String,
    pub user_id: Uuid,
    pub plan: SubscriptionTier,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// A created checkout session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLink {
    pub session_id: String,
    pub url: String,
}

/// Payment provider operations used by the billing endpoints
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Creates a customer and returns its id
    async fn create_customer(&self, email: &str, user_id: Uuid) -> Result<String, ProviderError>;

    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutLink, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(profile_email: Option<&str>, emails: Vec<VerifiedEmail>) -> GitHubIdentity {
        GitHubIdentity {
            id: "42".to_string(),
            login: "octo".to_string(),
            profile_email: profile_email.map(str::to_string),
            emails,
        }
    }

    fn email(address: &str, primary: bool) -> VerifiedEmail {
        VerifiedEmail {
            email: address.to_string(),
            primary,
            verified: true,
        }
    }

    #[test]
    fn test_primary_email_wins() {
        let id = identity(
            Some("public@example.com"),
            vec![email("other@example.com", false), email("main@example.com", true)],
        );
        assert_eq!(id.choose_email(), "main@example.com");
    }

    #[test]
    fn test_profile_email_fallback() {
        let id = identity(Some("public@example.com"), vec![email("other@example.com", false)]);
        assert_eq!(id.choose_email(), "public@example.com");
    }

    #[test]
    fn test_noreply_fallback() {
        let id = identity(Some(""), vec![]);
        assert_eq!(id.choose_email(), "42+octo@users.noreply.github.com");
    }

    #[test]
    fn test_checkout_link_serializes_camel_case() {
        let link = CheckoutLink {
            session_id: "cs_1".to_string(),
            url: "https://checkout.example/cs_1".to_string(),
        };
        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(value["sessionId"], "cs_1");
        assert_eq!(value["url"], "https://checkout.example/cs_1");
    }
}
