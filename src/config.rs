//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Which of the report-viewer servers to run
    #[serde(default)]
    pub variant: ServerVariant,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub crm: CrmConfig,
    pub datastore: DatastoreConfig,
    pub oidc: OidcConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

/// Server variant selector
///
/// Each variant exposes the same `/report` flow against a different
/// upstream and with a different identifier convention.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ServerVariant {
    /// `/report?contact_id=...` against the CRM contacts API
    #[default]
    Crm,
    /// `/report?email=...` against the datastore, any matching row
    Datastore,
    /// `/report?email=...` against the datastore, newest row wins
    DatastoreLatest,
    /// Datastore-backed report behind an OpenID Connect login
    Oidc,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 3000)
    pub port: u16,
    /// Public base URL, used to build the OIDC redirect URI
    /// (e.g., "https://reports.example.com")
    pub public_url: String,
}

impl ServerConfig {
    /// Redirect URI registered with the identity provider
    pub fn redirect_uri(&self) -> String {
        format!("{}/auth/callback", self.public_url.trim_end_matches('/'))
    }

    pub fn is_https(&self) -> bool {
        self.public_url
            .to_ascii_lowercase()
            .starts_with("https://")
    }
}

/// Session cookie configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// HMAC signing secret (32+ bytes)
    pub secret: String,
    /// Session time-to-live in seconds (default: 3600 = 1 hour)
    pub max_age: i64,
}

/// CRM API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrmConfig {
    /// Base URL of the contacts API
    pub api_base: String,
    /// Private bearer token; requests fail with a configuration error
    /// when absent
    pub private_token: Option<String>,
    /// Fixed API version header value
    pub api_version: String,
}

/// Hosted datastore configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatastoreConfig {
    /// Project base URL (e.g., "https://xyz.supabase.co")
    pub url: Option<String>,
    /// Service API key, sent as both `apikey` and bearer token
    pub api_key: Option<String>,
    /// Table holding report rows
    pub table: String,
}

/// OpenID Connect configuration (oidc variant)
#[derive(Debug, Clone, Deserialize)]
pub struct OidcConfig {
    /// Issuer URL; provider metadata is discovered from its
    /// well-known endpoint at startup
    pub issuer: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl OidcConfig {
    /// All three values an OIDC client needs, or `None` if any is missing
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        match (&self.issuer, &self.client_id, &self.client_secret) {
            (Some(issuer), Some(id), Some(secret))
                if !issuer.is_empty() && !id.is_empty() && !secret.is_empty() =>
            {
                Some((issuer, id, secret))
            }
            _ => None,
        }
    }
}

/// Report page configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Destination of the "Done" action on the report page.
    /// Falls back to a same-page action when unset.
    pub return_url: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

/// Placeholder secret accepted only with a warning
const DEFAULT_SESSION_SECRET: &str = "change-this-secret-in-production";

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (REPORTVIEW_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("variant", "crm")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.public_url", "http://localhost:3000")?
            .set_default("session.secret", DEFAULT_SESSION_SECRET)?
            .set_default("session.max_age", 3600)?
            .set_default("crm.api_base", "https://services.leadconnectorhq.com")?
            .set_default("crm.api_version", "2021-07-28")?
            .set_default("datastore.table", "reports")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (REPORTVIEW_*)
            .add_source(
                Environment::with_prefix("REPORTVIEW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_SESSION_SECRET_BYTES: usize = 32;

        if self.session.secret.as_bytes().len() < MIN_SESSION_SECRET_BYTES {
            return Err(crate::error::AppError::Config(format!(
                "session.secret must be at least {} bytes",
                MIN_SESSION_SECRET_BYTES
            )));
        }

        if self.session.secret == DEFAULT_SESSION_SECRET {
            tracing::warn!("session.secret is the placeholder value; change it in production");
        }

        if self.session.max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "session.max_age must be greater than 0".to_string(),
            ));
        }

        if self.variant == ServerVariant::Oidc && self.oidc.credentials().is_none() {
            tracing::warn!(
                "oidc.issuer/client_id/client_secret are not fully configured; \
                 /login will report SSO as unavailable"
            );
        }

        Ok(())
    }
}
