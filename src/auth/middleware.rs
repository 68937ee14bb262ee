//! Authentication middleware
//!
//! Gates the report route in the OIDC variant: requests without a
//! signed-in session are redirected to /login rather than rejected.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use super::session::{Session, session_from_jar};
use crate::AppState;

/// Middleware requiring a signed-in session
///
/// Verifies the session cookie and checks that a user has been
/// resolved into it. On success the session is added to request
/// extensions; otherwise the browser is redirected to /login.
///
/// # Usage
/// ```ignore
/// let gated = Router::new()
///     .route("/report", get(report))
///     .route_layer(middleware::from_fn_with_state(state, require_login));
/// ```
pub async fn require_login(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match session_from_jar(&jar, &state.config.session.secret) {
        Some(session) if session.user.is_some() => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        _ => Redirect::to("/login").into_response(),
    }
}

/// Extractor for the current signed-in session
///
/// Reads the session placed in extensions by [`require_login`], or
/// falls back to verifying the cookie directly. Rejects by redirecting
/// to /login.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Session);

/// Rejection that sends the browser to the login page
pub struct LoginRedirect;

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        Redirect::to("/login").into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            return Ok(CurrentUser(session));
        }

        let app_state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        match session_from_jar(&jar, &app_state.config.session.secret) {
            Some(session) if session.user.is_some() => {
                parts.extensions.insert(session.clone());
                Ok(CurrentUser(session))
            }
            _ => Err(LoginRedirect),
        }
    }
}
