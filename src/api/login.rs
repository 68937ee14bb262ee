//! OIDC login flow handlers
//!
//! Three-step flow: /login sends the browser to the identity provider
//! with fresh PKCE parameters, /auth/callback exchanges the returned
//! code for an identity, /done tears the session down.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::AppState;
use crate::auth::session::{
    Session, SessionUser, create_session_token, removal_cookie, session_cookie, session_from_jar,
};
use crate::error::AppError;

/// GET /login
///
/// Generates a fresh PKCE verifier/challenge pair and anti-forgery
/// state, persists both in the session cookie, and redirects to the
/// provider's authorization endpoint.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let client = state.sso.client().ok_or(AppError::SsoUnavailable)?;
    let request = client.authorization_request()?;

    let mut session = session_from_jar(&jar, &state.config.session.secret)
        .unwrap_or_else(|| Session::new(state.config.session.max_age));
    session.code_verifier = Some(request.code_verifier);
    session.state = Some(request.state);

    let token = create_session_token(&session, &state.config.session.secret)?;
    let jar = jar.add(session_cookie(token, state.config.server.is_https()));

    Ok((jar, Redirect::to(&request.url)).into_response())
}

/// Query parameters from the provider callback
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

/// GET /auth/callback
///
/// Validates the returned state against the session, presents the
/// stored PKCE verifier in the code exchange, and writes the resolved
/// claims into the session. Every failure renders the same generic
/// page; detail stays in the server log.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let client = state.sso.client().ok_or(AppError::SsoUnavailable)?;

    let session = session_from_jar(&jar, &state.config.session.secret).ok_or_else(|| {
        tracing::warn!("Callback without a handshake session");
        AppError::LoginFailed
    })?;

    let (Some(code), Some(returned_state)) = (query.code.as_deref(), query.state.as_deref())
    else {
        tracing::warn!("Callback missing code or state");
        return Err(AppError::LoginFailed);
    };

    let (Some(expected_state), Some(code_verifier)) =
        (session.state.as_deref(), session.code_verifier.as_deref())
    else {
        tracing::warn!("Session has no pending handshake");
        return Err(AppError::LoginFailed);
    };

    if returned_state != expected_state {
        tracing::warn!("State mismatch in callback");
        return Err(AppError::LoginFailed);
    }

    let user = client.authenticate(code, code_verifier).await?;
    tracing::info!(sub = %user.sub, "Login completed");

    // Fresh session: handshake material does not outlive the exchange.
    let mut session = Session::new(state.config.session.max_age);
    session.user = Some(SessionUser::Sso(user));
    let token = create_session_token(&session, &state.config.session.secret)?;
    let jar = jar.add(session_cookie(token, state.config.server.is_https()));

    Ok((jar, Redirect::to("/report")).into_response())
}

/// POST /done
///
/// Destroys the session and redirects to the configured return URL.
pub async fn done(State(state): State<AppState>, jar: CookieJar) -> Response {
    let jar = jar.remove(removal_cookie());
    let target = state
        .config
        .report
        .return_url
        .clone()
        .unwrap_or_else(|| "/".to_string());
    (jar, Redirect::to(&target)).into_response()
}
