/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use tokenforge_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config)?;
/// let app = tokenforge_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{method_not_allowed::json_method_not_allowed, security::SecurityHeadersLayer},
    providers::{BillingProvider, GitHubClient, IdentityProvider, StripeClient},
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use tokenforge_shared::auth::middleware::authenticate;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Timeout for outbound provider calls
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// OAuth identity provider
    pub identity: Arc<dyn IdentityProvider>,

    /// Payment provider
    pub billing: Arc<dyn BillingProvider>,
}

impl AppState {
    /// Creates state with the real GitHub and Stripe clients
    pub fn new(db: PgPool, config: Config) -> Result<Self, reqwest::Error> {
        let identity = GitHubClient::new(
            config.github.client_id.clone(),
            config.github.client_secret.clone(),
            PROVIDER_TIMEOUT,
        )?;
        let billing = StripeClient::new(config.stripe.secret_key.clone(), PROVIDER_TIMEOUT)?;

        if !identity.is_configured() {
            tracing::warn!("GitHub OAuth credentials not set; /auth/github will answer 500");
        }
        if !billing.is_configured() {
            tracing::warn!("Stripe secret key not set; /stripe/session will answer 500");
        }

        Ok(Self::with_providers(
            db,
            config,
            Arc::new(identity),
            Arc::new(billing),
        ))
    }

    /// Creates state with explicit providers
    pub fn with_providers(
        db: PgPool,
        config: Config,
        identity: Arc<dyn IdentityProvider>,
        billing: Arc<dyn BillingProvider>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            identity,
            billing,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                              # public
/// ├── POST /auth/github                         # public
/// ├── GET  /auth/me                             # session
/// ├── GET|POST /projects                        # session
/// ├── DELETE   /projects/:id                    # session
/// ├── GET|POST /projects/:id/tokens             # session
/// ├── GET  /projects/:id/versions               # session
/// ├── GET  /projects/:id/versions/:version_id   # session
/// ├── GET  /projects/:id/export                 # session
/// ├── POST /waitlist                            # public
/// ├── POST /stripe/session                      # session
/// └── POST /stripe/webhook                      # provider signature
/// ```
///
/// # Middleware Stack
///
/// Outermost first: security headers, 405 bodies, CORS, request tracing,
/// then session verification on the protected routes.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/github", post(routes::auth::github_login))
        .route("/waitlist", post(routes::waitlist::join))
        .route("/stripe/webhook", post(routes::billing::webhook));

    let session_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route("/projects/:id", delete(routes::projects::delete_project))
        .route(
            "/projects/:id/tokens",
            get(routes::tokens::list_tokens).post(routes::tokens::write_token),
        )
        .route("/projects/:id/versions", get(routes::versions::list_versions))
        .route(
            "/projects/:id/versions/:version_id",
            get(routes::versions::get_version),
        )
        .route("/projects/:id/export", get(routes::export::export_tokens))
        .route("/stripe/session", post(routes::billing::create_session))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.allows_any_origin() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(axum::middleware::from_fn(json_method_not_allowed))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

/// Session verification layer
///
/// Validates the bearer credential and injects `AuthContext` into request
/// extensions. Nothing downstream runs without it.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;

    tracing::debug!(user_id = %auth_context.user_id, "Session verified");
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
