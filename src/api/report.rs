//! Report route handlers
//!
//! One handler per upstream shape. Each performs exactly one outbound
//! call, then hands the fetched record to the renderer.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::Deserialize;

use crate::AppState;
use crate::auth::session::{Session, SessionUser, create_session_token, session_cookie};
use crate::auth::CurrentUser;
use crate::config::ServerVariant;
use crate::error::AppError;
use crate::render::{self, DoneAction};

/// Query parameters accepted by the CRM variant
///
/// The dashboard link passes the contact ID under one of three names;
/// the first present wins.
#[derive(Debug, Deserialize)]
pub struct CrmReportQuery {
    #[serde(default)]
    contact_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

impl CrmReportQuery {
    fn contact_id(&self) -> Option<&str> {
        [&self.contact_id, &self.user_id, &self.id]
            .into_iter()
            .find_map(|value| value.as_deref())
            .filter(|value| !value.is_empty())
    }
}

/// Query parameters accepted by the datastore variants
#[derive(Debug, Deserialize)]
pub struct EmailReportQuery {
    #[serde(default)]
    email: Option<String>,
}

impl EmailReportQuery {
    fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|value| !value.is_empty())
    }
}

/// GET /report (crm variant)
///
/// Fetches the contact, stores the member profile in the session
/// cookie, and renders the member report.
pub async fn crm_report(
    State(state): State<AppState>,
    Query(query): Query<CrmReportQuery>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let contact_id = query.contact_id().ok_or(AppError::MissingIdentifier {
        concept: "Contact Information",
        detail: "No contact ID was provided. Please access this page from your \
                 member dashboard.",
    })?;

    let profile = state.crm.fetch_contact(contact_id).await?;
    tracing::info!(contact_id, "Contact fetched");

    let mut session = Session::new(state.config.session.max_age);
    session.user = Some(SessionUser::Member(profile.clone()));
    let token = create_session_token(&session, &state.config.session.secret)?;
    let jar = jar.add(session_cookie(token, state.config.server.is_https()));

    let done = DoneAction::link(state.config.report.return_url.as_deref());
    let html = render::member_report_page(&profile, Utc::now(), &done);
    Ok((jar, Html(html)).into_response())
}

/// GET /report (datastore variants)
///
/// Fetches the row matching the email; the `datastore-latest` variant
/// asks the backend for the newest row.
pub async fn datastore_report(
    State(state): State<AppState>,
    Query(query): Query<EmailReportQuery>,
) -> Result<Html<String>, AppError> {
    let email = query.email().ok_or(AppError::MissingIdentifier {
        concept: "Email Address",
        detail: "No email address was provided. Please use the report link you \
                 were sent.",
    })?;

    let latest = state.config.variant == ServerVariant::DatastoreLatest;
    let row = state.datastore.fetch_report(email, latest).await?;
    if row.content().is_none() {
        return Err(AppError::ReportNotReady);
    }

    let done = DoneAction::link(state.config.report.return_url.as_deref());
    Ok(Html(render::stored_report_page(&row, email, &done)))
}

/// GET /report (oidc variant, behind the login gate)
///
/// The identifier is the `email` query parameter, falling back to the
/// signed-in user's email claim.
pub async fn sso_report(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Query(query): Query<EmailReportQuery>,
) -> Result<Html<String>, AppError> {
    let email = query
        .email()
        .or_else(|| session.user_email())
        .map(str::to_string)
        .ok_or(AppError::MissingIdentifier {
            concept: "Email Address",
            detail: "No email address was provided and your account has no email \
                     claim.",
        })?;

    let row = state.datastore.fetch_report(&email, false).await?;
    if row.content().is_none() {
        return Err(AppError::ReportNotReady);
    }

    Ok(Html(render::stored_report_page(
        &row,
        &email,
        &DoneAction::PostDone,
    )))
}
