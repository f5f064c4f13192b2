/// GitHub OAuth client
///
/// Three calls: code → access token, access token → profile, access token →
/// email list. The email list is best effort; a failure there falls back to
/// the profile email.

use super::{GitHubIdentity, IdentityProvider, ProviderError, VerifiedEmail};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;

const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "tokenforge-api";

/// GitHub client; credentials may be absent
#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    credentials: Option<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Profile {
    id: i64,
    login: String,
    email: Option<String>,
}

impl GitHubClient {
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            credentials: client_id.zip(client_secret),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn access_token(&self, code: &str) -> Result<String, ProviderError> {
        let (client_id, client_secret) = self
            .credentials
            .as_ref()
            .ok_or(ProviderError::NotConfigured("GitHub OAuth"))?;

        let response = self
            .http
            .post(TOKEN_URL)
            .header(header::ACCEPT, "application/json")
            .json(&serde_json::json!({
                "client_id": client_id,
                "client_secret": client_secret,
                "code": code,
            }))
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ProviderError::Upstream(format!(
                "GitHub token endpoint returned {}",
                status.as_u16()
            )));
        }

        let body: TokenResponse = response.json().await?;
        token_from_response(body)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, ProviderError> {
        let response = self
            .http
            .get(format!("{}{}", API_URL, path))
            .header(header::ACCEPT, "application/vnd.github+json")
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Upstream(format!(
                "GitHub {} returned {}",
                path,
                status.as_u16()
            )));
        }

        Ok(response.json().await?)
    }
}

fn token_from_response(body: TokenResponse) -> Result<String, ProviderError> {
    match (body.access_token, body.error) {
        (Some(token), None) if !token.is_empty() => Ok(token),
        (_, error) => {
            let reason = body
                .error_description
                .or(error)
                .unwrap_or_else(|| "No access token received.".to_string());
            Err(ProviderError::Rejected(format!(
                "Error fetching GitHub access token: {}",
                reason
            )))
        }
    }
}

#[async_trait]
impl IdentityProvider for GitHubClient {
    async fn exchange_code(&self, code: &str) -> Result<GitHubIdentity, ProviderError> {
        let token = self.access_token(code).await?;
        let profile: Profile = self.get_json("/user", &token).await?;

        let emails = match self.get_json::<Vec<VerifiedEmail>>("/user/emails", &token).await {
            Ok(emails) => emails,
            Err(e) => {
                tracing::warn!(github_id = profile.id, error = %e, "Could not list GitHub emails");
                Vec::new()
            }
        };

        Ok(GitHubIdentity {
            id: profile.id.to_string(),
            login: profile.login,
            profile_email: profile.email,
            emails,
        })
    }
}
