//! Session management
//!
//! Uses HMAC-signed tokens stored in cookies.
//! No server-side session storage needed.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::crm::MemberProfile;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Per-browser session data
///
/// Stored in a signed cookie. Starts without a user; the user is set
/// on the first successful identity resolution (CRM fetch or OIDC
/// callback). During the OIDC handshake the PKCE verifier and the
/// anti-forgery state live here too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    /// PKCE code verifier, present between /login and /auth/callback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_verifier: Option<String>,
    /// Anti-forgery state token, present between /login and /auth/callback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

/// Identity resolved into the session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionUser {
    /// CRM member subset
    Member(MemberProfile),
    /// OIDC claims subset
    Sso(SsoUser),
}

/// Claims subset extracted from the identity provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SsoUser {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Session {
    /// Fresh anonymous session valid for `max_age` seconds
    pub fn new(max_age: i64) -> Self {
        let now = Utc::now();
        Self {
            user: None,
            code_verifier: None,
            state: None,
            created_at: now,
            expires_at: now + Duration::seconds(max_age),
        }
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    /// Email associated with the session user, if any
    pub fn user_email(&self) -> Option<&str> {
        match &self.user {
            Some(SessionUser::Member(profile)) => Some(profile.email.as_str()),
            Some(SessionUser::Sso(user)) => user.email.as_deref(),
            None => None,
        }
    }
}

/// Create a signed session token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
pub fn create_session_token(
    session: &Session,
    secret: &str,
) -> Result<String, crate::error::AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Serialize session to JSON
    let payload =
        serde_json::to_string(session).map_err(|e| crate::error::AppError::Internal(e.into()))?;

    // 2. Base64 encode the payload
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    // 3. Create HMAC-SHA256 signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| crate::error::AppError::Internal(anyhow::anyhow!(e)))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    // 4. Return "{payload}.{signature}"
    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// Returns `None` if the signature is invalid, the token is malformed,
/// or the session is expired. Callers treat all three the same way: no
/// session.
pub fn verify_session_token(token: &str, secret: &str) -> Option<Session> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Split token into payload and signature
    let (payload_b64, signature_b64) = token.split_once('.')?;

    // 2. Verify HMAC signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload_b64.as_bytes());

    let expected_signature = general_purpose::URL_SAFE_NO_PAD.decode(signature_b64).ok()?;
    mac.verify_slice(&expected_signature).ok()?;

    // 3. Decode and deserialize payload
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
    let payload_str = String::from_utf8(payload_bytes).ok()?;
    let session: Session = serde_json::from_str(&payload_str).ok()?;

    // 4. Check if session is expired
    if session.is_expired() {
        return None;
    }

    Some(session)
}

/// Read and verify the session from the request's cookie jar
pub fn session_from_jar(jar: &CookieJar, secret: &str) -> Option<Session> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| verify_session_token(cookie.value(), secret))
}

/// Build the session cookie carrying a signed token
///
/// `HttpOnly` and `SameSite=Lax` always; `Secure` when the server's
/// public URL is https. Expiry is enforced by the signed payload, not
/// the cookie attributes.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Cookie removing the session
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    cookie
}
