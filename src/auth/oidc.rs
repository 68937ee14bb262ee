//! OpenID Connect client
//!
//! Authorization-code flow with PKCE. Provider endpoints are
//! discovered from the issuer's well-known configuration at startup;
//! identity claims are read from the userinfo endpoint after the code
//! exchange.

use serde::Deserialize;
use url::Url;

use super::pkce;
use super::session::SsoUser;
use crate::config::OidcConfig;
use crate::error::AppError;

/// Identity provider handle, constructed once at wiring time
///
/// Discovery failure leaves the provider in `Unconfigured`: the server
/// keeps running and `/login` explains that SSO is unavailable.
pub enum SsoProvider {
    Configured(OidcClient),
    Unconfigured,
}

impl SsoProvider {
    /// Discover the provider, downgrading any failure to `Unconfigured`
    pub async fn discover(
        http: &reqwest::Client,
        config: &OidcConfig,
        redirect_uri: String,
    ) -> Self {
        let Some((issuer, client_id, client_secret)) = config.credentials() else {
            tracing::warn!("OIDC credentials incomplete; starting without SSO");
            return SsoProvider::Unconfigured;
        };

        match OidcClient::discover(http.clone(), issuer, client_id, client_secret, redirect_uri)
            .await
        {
            Ok(client) => {
                tracing::info!(issuer, "OIDC provider discovered");
                SsoProvider::Configured(client)
            }
            Err(error) => {
                tracing::error!(%error, issuer, "OIDC discovery failed; /login is disabled");
                SsoProvider::Unconfigured
            }
        }
    }

    pub fn client(&self) -> Option<&OidcClient> {
        match self {
            SsoProvider::Configured(client) => Some(client),
            SsoProvider::Unconfigured => None,
        }
    }
}

/// Provider metadata subset read from the well-known document
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,
}

/// OIDC client bound to a fixed redirect URI
pub struct OidcClient {
    http: reqwest::Client,
    metadata: ProviderMetadata,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

/// Authorization URL with the PKCE parameters to store in the session
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub code_verifier: String,
}

/// Token response from the provider's token endpoint
///
/// Only the access token is read; claims come from the userinfo
/// endpoint rather than the id_token.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl OidcClient {
    /// Fetch provider metadata from the issuer's well-known endpoint
    pub async fn discover(
        http: reqwest::Client,
        issuer: &str,
        client_id: &str,
        client_secret: &str,
        redirect_uri: String,
    ) -> Result<Self, AppError> {
        let url = format!(
            "{}/.well-known/openid-configuration",
            issuer.trim_end_matches('/')
        );
        let response = http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "issuer discovery returned {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let metadata: ProviderMetadata = response.json().await?;

        Ok(Self {
            http,
            metadata,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri,
        })
    }

    /// Generate an authorization URL with fresh PKCE parameters
    ///
    /// A new verifier/challenge pair and state token per call; the
    /// caller persists verifier and state in the session.
    pub fn authorization_request(&self) -> Result<AuthorizationRequest, AppError> {
        let state = pkce::generate_state();
        let code_verifier = pkce::generate_code_verifier();
        let code_challenge = pkce::generate_code_challenge(&code_verifier);

        let mut url = Url::parse(&self.metadata.authorization_endpoint).map_err(|e| {
            AppError::Config(format!("invalid authorization endpoint: {e}"))
        })?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", "openid profile email")
            .append_pair("state", &state)
            .append_pair("code_challenge", &code_challenge)
            .append_pair("code_challenge_method", "S256");

        Ok(AuthorizationRequest {
            url: url.into(),
            state,
            code_verifier,
        })
    }

    /// Exchange an authorization code and resolve identity claims
    ///
    /// Failures are logged with their detail and surfaced to the
    /// client as the generic `LoginFailed` page.
    pub async fn authenticate(&self, code: &str, code_verifier: &str) -> Result<SsoUser, AppError> {
        let token = self.exchange_code(code, code_verifier).await?;
        self.fetch_claims(&token.access_token).await
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, AppError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code_verifier", code_verifier),
        ];

        let response = self
            .http
            .post(&self.metadata.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|error| {
                tracing::error!(%error, "Token exchange request failed");
                AppError::LoginFailed
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body, "Token exchange rejected");
            return Err(AppError::LoginFailed);
        }

        response.json::<TokenResponse>().await.map_err(|error| {
            tracing::error!(%error, "Token response could not be parsed");
            AppError::LoginFailed
        })
    }

    async fn fetch_claims(&self, access_token: &str) -> Result<SsoUser, AppError> {
        let Some(userinfo_endpoint) = self.metadata.userinfo_endpoint.as_deref() else {
            tracing::error!("Provider metadata has no userinfo endpoint");
            return Err(AppError::LoginFailed);
        };

        let response = self
            .http
            .get(userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| {
                tracing::error!(%error, "Userinfo request failed");
                AppError::LoginFailed
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "Userinfo request rejected");
            return Err(AppError::LoginFailed);
        }

        response.json::<SsoUser>().await.map_err(|error| {
            tracing::error!(%error, "Userinfo response could not be parsed");
            AppError::LoginFailed
        })
    }
}
