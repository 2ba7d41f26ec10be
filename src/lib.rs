//! # adctl: Control Plane for Programmatic Advertising
//!
//! `adctl` is a control plane for managing programmatic ad campaigns across
//! multiple advertiser organizations. It provides a RESTful API for managing
//! organizations, users, ads, and deals, along with the execution pipeline
//! that matches incoming ad requests against deal targeting, selects the best
//! ad, prices the impression, and tracks delivery performance.
//!
//! ## Overview
//!
//! `adctl` sits between ad-serving integrations and the campaign data they
//! operate on. Platforms running deals for many advertisers face challenges
//! around multi-tenancy, budget enforcement, and consistent pricing. This
//! crate addresses those by providing a single control layer that handles
//! authentication, authorization, deal lifecycle management, and delivery
//! accounting.
//!
//! ### What It Does
//!
//! At its core, `adctl` receives an ad request for a deal, authenticates the
//! caller, runs the deal's eligibility gates (status, flight window, budget),
//! matches the request against the deal's targeting spec, scores the
//! organization's active ads to pick a winner, prices the impression between
//! the deal's floor and target CPM, and records the spend and impression
//! atomically. Around that pipeline it manages the full campaign surface:
//! organizations, users and their API keys, creatives, deal status
//! transitions, inventory estimates, and performance rollups.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL for all persistence. Request handlers
//! authenticate via API keys or a trusted proxy header, authorize against
//! role-derived permissions, and reach the database through repository
//! interfaces. Deal execution runs inside a transaction holding a row lock on
//! the deal, so concurrent executions cannot overspend a budget.
//!
//! The pure decision logic (targeting, selection, pricing, gates, metrics)
//! lives in [`engine`] with no I/O, and the [`db`] layer composes it with
//! storage.

pub mod api;
pub mod auth;
pub mod config;
mod crypto;
pub mod db;
pub mod engine;
pub mod errors;
pub mod limits;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::{
    api::models::users::Role,
    db::handlers::{Organizations, Repository, Users},
    db::models::{organizations::OrganizationCreateDBRequest, users::UserCreateDBRequest},
    openapi::ApiDoc,
};
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{AdId, ApiKeyId, DealId, OrganizationId, UserId};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `db`: PostgreSQL connection pool for application data
/// - `config`: Application configuration loaded from environment/files
/// - `rate_limiter`: Per-caller fixed-window request counters
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    #[builder(default = Arc::new(limits::RateLimiter::new()))]
    pub rate_limiter: Arc<limits::RateLimiter>,
}

/// Get the adctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user and its organization if they don't exist.
///
/// This function is idempotent and is called during application startup so
/// there is always an admin able to bootstrap the platform. The organization
/// is looked up by slug and the user by email; whichever already exists is
/// left untouched.
///
/// Returns the user ID of the created or existing admin user.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(email: &str, organization_slug: &str, db: &PgPool) -> anyhow::Result<UserId> {
    let mut tx = db.begin().await?;

    let existing_org = Organizations::new(&mut tx).get_by_slug(organization_slug).await?;
    let organization = match existing_org {
        Some(org) => org,
        None => {
            Organizations::new(&mut tx)
                .create(&OrganizationCreateDBRequest {
                    name: organization_slug.to_string(),
                    slug: organization_slug.to_string(),
                })
                .await?
        }
    };

    let mut users = Users::new(&mut tx);
    if let Some(existing) = users.get_user_by_email(email).await? {
        tx.commit().await?;
        return Ok(existing.id);
    }

    let created = users
        .create(&UserCreateDBRequest {
            organization_id: organization.id,
            email: email.to_string(),
            display_name: None,
            is_admin: true,
            roles: vec![Role::PlatformManager],
        })
        .await?;

    tx.commit().await?;
    info!("Created initial admin user {}", email);
    Ok(created.id)
}

/// Connect to the database, run migrations, and ensure the admin user exists.
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("No database URL configured; set DATABASE_URL or database_url"))?;

    let pool = PgPool::connect(database_url).await?;
    migrator().run(&pool).await?;

    create_initial_admin_user(&config.admin_email, &config.admin_organization, &pool).await?;

    Ok(pool)
}

/// Build the main application router with all endpoints and middleware.
///
/// This function constructs the complete Axum router with:
/// - Management API routes under `/api/v1`
/// - OpenAPI documentation at `/docs`
/// - Health check at `/healthz`
/// - Optional per-caller rate limiting
/// - CORS and tracing middleware
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Organization management
        .route("/organizations", get(api::handlers::organizations::list_organizations))
        .route("/organizations", post(api::handlers::organizations::create_organization))
        .route("/organizations/{org_id}", get(api::handlers::organizations::get_organization))
        .route("/organizations/{org_id}", patch(api::handlers::organizations::update_organization))
        .route("/organizations/{org_id}", delete(api::handlers::organizations::delete_organization))
        // User management
        .route("/users", get(api::handlers::users::list_users))
        .route("/users", post(api::handlers::users::create_user))
        .route("/users/{user_id}", get(api::handlers::users::get_user))
        .route("/users/{user_id}", patch(api::handlers::users::update_user))
        .route("/users/{user_id}", delete(api::handlers::users::delete_user))
        // API keys as user sub-resources
        .route("/users/{user_id}/api-keys", get(api::handlers::api_keys::list_user_api_keys))
        .route("/users/{user_id}/api-keys", post(api::handlers::api_keys::create_user_api_key))
        .route(
            "/users/{user_id}/api-keys/{key_id}",
            get(api::handlers::api_keys::get_user_api_key),
        )
        .route(
            "/users/{user_id}/api-keys/{key_id}",
            delete(api::handlers::api_keys::delete_user_api_key),
        )
        // Creative inventory
        .route("/ads", get(api::handlers::ads::list_ads))
        .route("/ads", post(api::handlers::ads::create_ad))
        .route("/ads/{ad_id}", get(api::handlers::ads::get_ad))
        .route("/ads/{ad_id}", patch(api::handlers::ads::update_ad))
        .route("/ads/{ad_id}", delete(api::handlers::ads::delete_ad))
        // Deal lifecycle and execution
        .route("/deals", get(api::handlers::deals::list_deals))
        .route("/deals", post(api::handlers::deals::create_deal))
        .route("/deals/{deal_id}", get(api::handlers::deals::get_deal))
        .route("/deals/{deal_id}", patch(api::handlers::deals::update_deal))
        .route("/deals/{deal_id}", delete(api::handlers::deals::delete_deal))
        .route("/deals/{deal_id}/status", patch(api::handlers::deals::transition_deal_status))
        .route("/deals/{deal_id}/execute", post(api::handlers::deals::execute_deal))
        .route("/deals/{deal_id}/inventory", get(api::handlers::deals::get_deal_inventory))
        .route("/deals/{deal_id}/metrics", get(api::handlers::deals::get_deal_metrics))
        .route("/deals/{deal_id}/performance", get(api::handlers::deals::get_deal_performance))
        // Analytics
        .route("/analytics/organization", get(api::handlers::analytics::get_organization_analytics))
        .with_state(state.clone());

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    if state.config.rate_limit.enabled {
        router = router.layer(from_fn_with_state(state.clone(), limits::rate_limit_middleware));
    }

    router.layer(CorsLayer::permissive()).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to the database, runs
///    migrations, and ensures the initial admin user exists
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts
///    handling requests
/// 3. **Shutdown**: when the shutdown signal resolves, in-flight requests
///    drain and connections close
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting control plane with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;
        Ok(Self::from_pool(config, pool))
    }

    /// Create an application on an existing pool, running migrations and
    /// bootstrapping the admin user against it.
    pub async fn new_with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        migrator().run(&pool).await?;
        create_initial_admin_user(&config.admin_email, &config.admin_organization, &pool).await?;
        Ok(Self::from_pool(config, pool))
    }

    fn from_pool(config: Config, pool: PgPool) -> Self {
        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(state);

        Self { router, config, pool }
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        // Real HTTP transport so ConnectInfo is populated for the rate limiter.
        axum_test::TestServer::builder()
            .http_transport()
            .build(self.router.into_make_service_with_connect_info::<SocketAddr>())
            .expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "adctl listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
