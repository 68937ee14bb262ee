//! Common test utilities for E2E tests
//!
//! Spins up the server under test plus stub upstream services (CRM
//! API, datastore REST surface, identity provider) on ephemeral ports.

#![allow(dead_code)]

use std::collections::HashMap;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::extract::{Path, Query};
use axum::{Form, Router};
use serde_json::json;
use tokio::net::TcpListener;

use reportview::{AppState, build_router, config};

/// Bearer token the CRM stub expects
pub const CRM_TOKEN: &str = "test-crm-token";
/// API key the datastore stub expects
pub const DATASTORE_KEY: &str = "test-datastore-key";
/// Return URL wired into the test configuration
pub const RETURN_URL: &str = "https://app.example.com/dashboard";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Start the server under test with the given configuration
    pub async fn start(config: config::AppConfig) -> Self {
        let state = AppState::new(config).await.unwrap();
        let app = build_router(state);

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        // Cookie-aware client that surfaces redirects instead of
        // following them
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        Self { addr, client }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }
}

/// Base test configuration; upstreams are pointed at stubs by the
/// individual tests.
pub fn test_config(variant: config::ServerVariant) -> config::AppConfig {
    config::AppConfig {
        variant,
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            public_url: "http://localhost:3000".to_string(),
        },
        session: config::SessionConfig {
            secret: "test-secret-key-32-bytes-long!!!".to_string(),
            max_age: 3600,
        },
        crm: config::CrmConfig {
            api_base: "http://127.0.0.1:1".to_string(),
            private_token: Some(CRM_TOKEN.to_string()),
            api_version: "2021-07-28".to_string(),
        },
        datastore: config::DatastoreConfig {
            url: None,
            api_key: Some(DATASTORE_KEY.to_string()),
            table: "reports".to_string(),
        },
        oidc: config::OidcConfig {
            issuer: None,
            client_id: Some("test-client".to_string()),
            client_secret: Some("test-client-secret".to_string()),
        },
        report: config::ReportConfig {
            return_url: Some(RETURN_URL.to_string()),
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

/// Spawn a stub service and return its base URL
pub async fn spawn_stub(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    addr
}

// =============================================================================
// CRM API stub
// =============================================================================

/// Stub of the CRM contacts endpoint
///
/// Requires the bearer token and version header the real API requires,
/// so passing tests also prove the headers are sent.
pub async fn spawn_crm_stub() -> String {
    spawn_stub(Router::new().route("/contacts/:id", get(crm_contact))).await
}

async fn crm_contact(Path(id): Path<String>, headers: HeaderMap) -> Response {
    let expected = format!("Bearer {CRM_TOKEN}");
    let authorized = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        == Some(expected.as_str());
    if !authorized || headers.get("version").is_none() {
        return (StatusCode::UNAUTHORIZED, "missing credentials").into_response();
    }

    match id.as_str() {
        "c-404" => (StatusCode::NOT_FOUND, "no such contact").into_response(),
        "c-500" => (StatusCode::INTERNAL_SERVER_ERROR, "upstream broke").into_response(),
        "c-partial" => Json(json!({ "contact": { "id": "c-partial" } })).into_response(),
        _ => Json(json!({
            "contact": {
                "id": id,
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@example.com",
                "phone": "555-0100"
            }
        }))
        .into_response(),
    }
}

// =============================================================================
// Datastore stub
// =============================================================================

/// Stub of the datastore's REST surface
///
/// Routes on the email filter value; echoes whether the latest-first
/// ordering was requested so tests can assert it.
pub async fn spawn_datastore_stub() -> String {
    spawn_stub(Router::new().route("/rest/v1/reports", get(datastore_rows))).await
}

async fn datastore_rows(
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if headers
        .get("apikey")
        .and_then(|value| value.to_str().ok())
        != Some(DATASTORE_KEY)
    {
        return (StatusCode::UNAUTHORIZED, "missing api key").into_response();
    }

    let email = params
        .get("email")
        .and_then(|value| value.strip_prefix("eq."))
        .unwrap_or_default()
        .to_string();

    match email.as_str() {
        "missing@x.com" => (
            StatusCode::NOT_ACCEPTABLE,
            Json(json!({
                "code": "PGRST116",
                "message": "JSON object requested, multiple (or no) rows returned"
            })),
        )
            .into_response(),
        "boom@x.com" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "code": "XX000",
                "message": "relation \"reports\" does not exist"
            })),
        )
            .into_response(),
        "empty@x.com" => Json(json!({
            "full_name": "Pending User",
            "email": email
        }))
        .into_response(),
        _ => {
            let body = if params.contains_key("order") {
                "<p>Latest</p>"
            } else {
                "<p>Hi</p>"
            };
            Json(json!({
                "full_name": "Ada Lovelace",
                "company": "Analytical Engines",
                "email": email,
                "report_html": body,
                "report_type": "quarterly",
                "created_at": "2024-06-01T12:00:00Z"
            }))
            .into_response()
        }
    }
}

// =============================================================================
// Identity provider stub
// =============================================================================

pub const IDP_ACCESS_TOKEN: &str = "stub-access-token";
pub const IDP_VALID_CODE: &str = "valid-code";

/// Stub identity provider serving discovery, token, and userinfo
pub async fn spawn_idp_stub() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let discovery_base = base.clone();
    let router = Router::new()
        .route(
            "/.well-known/openid-configuration",
            get(move || {
                let base = discovery_base.clone();
                async move {
                    Json(json!({
                        "issuer": base,
                        "authorization_endpoint": format!("{base}/authorize"),
                        "token_endpoint": format!("{base}/token"),
                        "userinfo_endpoint": format!("{base}/userinfo"),
                    }))
                }
            }),
        )
        .route("/token", post(idp_token))
        .route("/userinfo", get(idp_userinfo));

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    base
}

async fn idp_token(Form(params): Form<HashMap<String, String>>) -> Response {
    let valid = params.get("grant_type").map(String::as_str) == Some("authorization_code")
        && params.get("code").map(String::as_str) == Some(IDP_VALID_CODE)
        && params.contains_key("code_verifier")
        && params.contains_key("client_id");
    if valid {
        Json(json!({
            "access_token": IDP_ACCESS_TOKEN,
            "token_type": "Bearer",
            "expires_in": 3600
        }))
        .into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant" })),
        )
            .into_response()
    }
}

async fn idp_userinfo(headers: HeaderMap) -> Response {
    let expected = format!("Bearer {IDP_ACCESS_TOKEN}");
    let authorized = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        == Some(expected.as_str());
    if authorized {
        Json(json!({
            "sub": "user-1",
            "email": "a@x.com",
            "name": "Ada Lovelace"
        }))
        .into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "bad token").into_response()
    }
}
