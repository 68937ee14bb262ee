//! ReportView - small "view my report" web servers
//!
//! Four server variants behind one binary, selected by configuration:
//!
//! - `crm`: `/report?contact_id=...` fetched from the member CRM API
//! - `datastore`: `/report?email=...` fetched from the hosted datastore
//! - `datastore-latest`: as above, newest row per email wins
//! - `oidc`: datastore-backed report behind an OpenID Connect login
//!
//! Each variant is a thin controller: route handlers call one external
//! service and render the result into an HTML page.
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `auth`: OIDC flow, cookie sessions, login gate
//! - `crm`: CRM contact fetcher
//! - `datastore`: hosted datastore fetcher
//! - `render`: pure HTML rendering
//! - `config`: configuration management
//! - `error`: error types

pub mod api;
pub mod auth;
pub mod config;
pub mod crm;
pub mod datastore;
pub mod error;
pub mod render;

use std::sync::Arc;

use crate::config::ServerVariant;

/// Application state shared across all handlers
///
/// Every external dependency is constructed here at wiring time and
/// passed into the router; handlers never reach for ambient state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// CRM contacts API client
    pub crm: Arc<crm::CrmClient>,

    /// Hosted datastore client
    pub datastore: Arc<datastore::DatastoreClient>,

    /// Identity provider handle; `Unconfigured` when discovery failed
    /// or the oidc variant is not selected
    pub sso: Arc<auth::SsoProvider>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Build the shared HTTP client (bounded request timeout)
    /// 2. Construct the upstream clients
    /// 3. Discover the identity provider (oidc variant only)
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Shared HTTP client. The explicit timeout bounds every
        // outbound call so a slow upstream cannot hang a request.
        let http_client = reqwest::Client::builder()
            .user_agent("ReportView/0.1.0")
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        // 2. Upstream clients
        let crm = crm::CrmClient::new(http_client.clone(), &config.crm);
        let datastore = datastore::DatastoreClient::new(http_client.clone(), &config.datastore);

        // 3. Identity provider discovery. Failure leaves the provider
        // unconfigured; the server still starts.
        let sso = if config.variant == ServerVariant::Oidc {
            auth::SsoProvider::discover(
                &http_client,
                &config.oidc,
                config.server.redirect_uri(),
            )
            .await
        } else {
            auth::SsoProvider::Unconfigured
        };

        tracing::info!(variant = ?config.variant, "Application state initialized");

        Ok(Self {
            config: Arc::new(config),
            crm: Arc::new(crm),
            datastore: Arc::new(datastore),
            sso: Arc::new(sso),
        })
    }
}

/// Build the Axum router for the configured variant.
///
/// This is shared by the binary and the integration tests to keep
/// route composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::routing::{get, post};
    use axum::{Router, middleware};
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    let variant_routes: Router<AppState> = match state.config.variant {
        ServerVariant::Crm => Router::new().route("/report", get(api::crm_report)),
        ServerVariant::Datastore | ServerVariant::DatastoreLatest => {
            Router::new().route("/report", get(api::datastore_report))
        }
        ServerVariant::Oidc => Router::new()
            .route("/report", get(api::sso_report))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_login,
            ))
            .route("/login", get(api::login))
            .route("/auth/callback", get(api::callback))
            .route("/done", post(api::done)),
    };

    Router::new()
        .route("/", get(api::landing))
        .route("/healthz", get(api::healthz))
        .merge(variant_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
