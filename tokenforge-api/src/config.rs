/// Configuration management for the API server
///
/// Configuration comes from environment variables; a `.env` file is honoured
/// in development.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `JWT_SECRET`: Session signing key, at least 32 characters (required)
/// - `API_HOST` / `API_PORT`: Bind address (default: 0.0.0.0:8080)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_EXPIRY_DAYS`: Session lifetime (default: 7)
/// - `CORS_ORIGINS`: Comma-separated allow-list, or `*` (default: `*`)
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `APP_URL`: Web app base URL for checkout redirects (default: http://localhost:3000)
/// - `GITHUB_CLIENT_ID` / `GITHUB_CLIENT_SECRET`: OAuth app credentials
/// - `STRIPE_SECRET_KEY` / `STRIPE_WEBHOOK_SECRET`: Payment provider credentials
/// - `STRIPE_PRO_PRICE_ID` / `STRIPE_TEAM_PRICE_ID`: Price ids per paid tier
/// - `RUST_LOG` / `LOG_FORMAT`: Log filter and `json` output (read in `main`)
///
/// Provider credentials are optional. Without them the server still starts
/// and only the affected endpoints answer "not configured".
///
/// # Example
///
/// ```no_run
/// use tokenforge_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use tokenforge_shared::billing::reconcile::PriceCatalog;

/// Minimum JWT secret length
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub github: GithubConfig,
    pub stripe: StripeConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS)
    pub production: bool,

    /// Web app base URL
    pub app_url: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Signing secret. Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,

    /// Session lifetime in days
    pub expiry_days: i64,
}

/// GitHub OAuth app credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubConfig {
    pub client_id: Option<String>,

    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
}

/// Payment provider credentials and prices
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StripeConfig {
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,

    #[serde(skip_serializing)]
    pub webhook_secret: Option<String>,

    pub pro_price_id: Option<String>,
    pub team_price_id: Option<String>,
}

impl StripeConfig {
    /// Price ids per paid tier
    pub fn catalog(&self) -> PriceCatalog {
        PriceCatalog {
            pro: self.pro_price_id.clone(),
            team: self.team_price_id.clone(),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_host = get("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let api_port = get("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is not a valid port: {}", e))?;

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let production = get("PRODUCTION")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let app_url = get("APP_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = get("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is not a number: {}", e))?;

        let jwt_secret = get("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_JWT_SECRET_LEN);
        }

        let expiry_days = get("JWT_EXPIRY_DAYS")
            .unwrap_or_else(|| "7".to_string())
            .parse::<i64>()
            .map_err(|e| anyhow::anyhow!("JWT_EXPIRY_DAYS is not a number: {}", e))?;

        if expiry_days <= 0 {
            anyhow::bail!("JWT_EXPIRY_DAYS must be positive");
        }

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
                app_url,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiry_days,
            },
            github: GithubConfig {
                client_id: get("GITHUB_CLIENT_ID"),
                client_secret: get("GITHUB_CLIENT_SECRET"),
            },
            stripe: StripeConfig {
                secret_key: get("STRIPE_SECRET_KEY"),
                webhook_secret: get("STRIPE_WEBHOOK_SECRET"),
                pro_price_id: get("STRIPE_PRO_PRICE_ID"),
                team_price_id: get("STRIPE_TEAM_PRICE_ID"),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether any origin is allowed
    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|o| o == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/t"), ("JWT_SECRET", SECRET)]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.jwt.expiry_days, 7);
        assert!(config.allows_any_origin());
        assert!(!config.api.production);
        assert_eq!(config.api.app_url, "http://localhost:3000");
        assert!(config.github.client_id.is_none());
        assert!(config.stripe.secret_key.is_none());
    }

    #[test]
    fn test_required_variables() {
        assert!(load(&[("JWT_SECRET", SECRET)]).is_err());
        assert!(load(&[("DATABASE_URL", "postgres://localhost/t")]).is_err());

        let short = load(&[("DATABASE_URL", "postgres://localhost/t"), ("JWT_SECRET", "short")]);
        assert!(short.unwrap_err().to_string().contains("at least 32"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/t"),
            ("JWT_SECRET", SECRET),
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "9000"),
            ("CORS_ORIGINS", "https://app.example.com, https://www.example.com"),
            ("PRODUCTION", "true"),
            ("APP_URL", "https://app.example.com/"),
            ("STRIPE_PRO_PRICE_ID", "price_pro"),
            ("GITHUB_CLIENT_ID", "  "),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(
            config.api.cors_origins,
            vec!["https://app.example.com", "https://www.example.com"]
        );
        assert!(!config.allows_any_origin());
        assert!(config.api.production);
        assert_eq!(config.api.app_url, "https://app.example.com");
        assert_eq!(config.stripe.catalog().pro.as_deref(), Some("price_pro"));
        assert!(config.github.client_id.is_none());
    }

    #[test]
    fn test_invalid_numbers() {
        let base = [("DATABASE_URL", "postgres://localhost/t"), ("JWT_SECRET", SECRET)];

        let mut vars = base.to_vec();
        vars.push(("API_PORT", "http"));
        assert!(load(&vars).is_err());

        let mut vars = base.to_vec();
        vars.push(("JWT_EXPIRY_DAYS", "0"));
        assert!(load(&vars).is_err());
    }
}
