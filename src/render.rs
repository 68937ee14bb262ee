//! HTML rendering
//!
//! Pure functions mapping fetched records (plus optional session data)
//! to document strings. No I/O and no clock reads; timestamps are
//! passed in by the caller so output is fully determined by input.
//!
//! Every scalar value is HTML-escaped before interpolation. The stored
//! report body (`report_html`/`html_content`) is the one exception: it
//! is trusted upstream HTML and embedded verbatim.

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::crm::MemberProfile;
use crate::datastore::ReportRow;

/// Destination of the single "Done" action on a report page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoneAction {
    /// Plain link; used by the variants without a login flow
    Link { href: String },
    /// Form POST to `/done`, which tears down the session and redirects
    PostDone,
}

impl DoneAction {
    /// Link to the configured return URL, or the same-page fallback
    /// when none is configured.
    pub fn link(return_url: Option<&str>) -> Self {
        DoneAction::Link {
            href: return_url
                .filter(|url| !url.is_empty())
                .unwrap_or("javascript:window.close();")
                .to_string(),
        }
    }

    fn to_html(&self) -> String {
        match self {
            DoneAction::Link { href } => format!(
                r#"<a href="{}" class="done-button">Done - Return to Dashboard</a>"#,
                encode_double_quoted_attribute(href)
            ),
            DoneAction::PostDone => concat!(
                r#"<form method="post" action="/done">"#,
                r#"<button type="submit" class="done-button">Done - Return to Dashboard</button>"#,
                "</form>"
            )
            .to_string(),
        }
    }
}

const BASE_STYLE: &str = "body { font-family: Arial, sans-serif; max-width: 600px; \
                          margin: 50px auto; padding: 20px; }";

const ERROR_STYLE: &str = ".error { background: #f8d7da; color: #721c24; padding: 20px; \
                           border-radius: 4px; }";

const INFO_STYLE: &str = ".info { background: #e9ecef; padding: 20px; border-radius: 4px; }";

const REPORT_STYLE: &str = "\
body { font-family: Arial, sans-serif; max-width: 800px; margin: 30px auto; padding: 20px; background: #f5f5f5; }\n\
.report-container { background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }\n\
h1 { color: #333; border-bottom: 2px solid #007bff; padding-bottom: 10px; }\n\
.user-info { background: #e9ecef; padding: 15px; border-radius: 4px; margin: 20px 0; }\n\
.user-info p { margin: 8px 0; }\n\
.report-content { margin: 20px 0; line-height: 1.6; }\n\
.data-section { margin: 20px 0; }\n\
.data-section h3 { color: #555; margin-bottom: 10px; }\n\
.done-button { background: #28a745; color: white; padding: 12px 30px; border: none; border-radius: 4px; cursor: pointer; font-size: 16px; margin-top: 20px; text-decoration: none; display: inline-block; }\n\
.done-button:hover { background: #218838; }";

/// Wrap a body fragment in a full HTML document
fn document(title: &str, style: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <title>{title}</title>\n\
         <style>\n{style}\n</style>\n\
         </head>\n\
         <body>\n{body}\n</body>\n\
         </html>\n",
        title = encode_text(title),
    )
}

/// GET / landing page
pub fn landing_page() -> String {
    document(
        "Report Viewer",
        &format!("{BASE_STYLE}\n{INFO_STYLE}"),
        "<h1>Welcome to Report Viewer</h1>\n\
         <div class=\"info\">\n\
         <p>This application should be accessed from your member dashboard.</p>\n\
         <p>Please click the \"View My Report\" button in your dashboard to continue.</p>\n\
         </div>",
    )
}

/// 400 page naming the missing identifier concept
pub fn missing_identifier_page(concept: &str, detail: &str) -> String {
    document(
        "Error",
        &format!("{BASE_STYLE}\n{ERROR_STYLE}"),
        &format!(
            "<div class=\"error\">\n<h2>Missing {}</h2>\n<p>{}</p>\n</div>",
            encode_text(concept),
            encode_text(detail),
        ),
    )
}

/// 404 page for an identifier that matched nothing
pub fn report_not_found_page() -> String {
    document(
        "Report Not Found",
        &format!("{BASE_STYLE}\n{ERROR_STYLE}"),
        "<div class=\"error\">\n\
         <h2>Report Not Found</h2>\n\
         <p>We could not find a report for that address. Please check the \
         link you followed or contact support.</p>\n\
         </div>",
    )
}

/// 404 page for a row that exists but has no content yet
pub fn report_not_ready_page() -> String {
    document(
        "Report Not Ready",
        &format!("{BASE_STYLE}\n{INFO_STYLE}"),
        "<div class=\"info\">\n\
         <h2>Your Report Is Not Ready Yet</h2>\n\
         <p>We found your record, but your report has not been generated yet. \
         Please check back later.</p>\n\
         </div>",
    )
}

/// 500 page echoing a short diagnostic message
pub fn server_error_page(detail: &str) -> String {
    document(
        "Error",
        &format!("{BASE_STYLE}\n{ERROR_STYLE}"),
        &format!(
            "<div class=\"error\">\n\
             <h2>Error Loading Report</h2>\n\
             <p>Unable to retrieve your information. Please try again or contact support.</p>\n\
             <p><small>Error: {}</small></p>\n\
             </div>",
            encode_text(detail),
        ),
    )
}

/// Generic login-failure page; never carries the underlying detail
pub fn login_failed_page() -> String {
    document(
        "Login Failed",
        &format!("{BASE_STYLE}\n{ERROR_STYLE}"),
        "<div class=\"error\">\n\
         <h2>Login Failed</h2>\n\
         <p>We could not sign you in. Please try again.</p>\n\
         <p><a href=\"/login\">Back to login</a></p>\n\
         </div>",
    )
}

/// Shown when provider discovery failed at startup
pub fn sso_unavailable_page() -> String {
    document(
        "Sign-In Unavailable",
        &format!("{BASE_STYLE}\n{ERROR_STYLE}"),
        "<div class=\"error\">\n\
         <h2>Sign-In Unavailable</h2>\n\
         <p>Single sign-on is not configured. Please contact support.</p>\n\
         </div>",
    )
}

/// CRM member report
///
/// Mirrors the member dashboard layout: identity block, report
/// sections, one Done action.
pub fn member_report_page(
    user: &MemberProfile,
    generated_at: DateTime<Utc>,
    done: &DoneAction,
) -> String {
    let full_name = user.full_name();
    let body = format!(
        "<div class=\"report-container\">\n\
         <h1>Your Personal Report</h1>\n\
         <div class=\"user-info\">\n\
         <p><strong>Name:</strong> {name}</p>\n\
         <p><strong>Email:</strong> {email}</p>\n\
         <p><strong>Phone:</strong> {phone}</p>\n\
         <p><strong>Member ID:</strong> {id}</p>\n\
         </div>\n\
         <div class=\"report-content\">\n\
         <h2>Report Details</h2>\n\
         <div class=\"data-section\">\n\
         <h3>Account Information</h3>\n\
         <p>Report generated: {generated}</p>\n\
         <p>Status: Active Member</p>\n\
         </div>\n\
         <div class=\"data-section\">\n\
         <h3>Your Data</h3>\n\
         <p>This is where personalized information, charts, and statistics \
         for {first_name} are displayed.</p>\n\
         </div>\n\
         </div>\n\
         {done}\n\
         </div>",
        name = encode_text(&full_name),
        email = encode_text(&user.email),
        phone = encode_text(&user.phone),
        id = encode_text(&user.id),
        generated = generated_at.format("%B %d, %Y at %H:%M UTC"),
        first_name = encode_text(&user.first_name),
        done = done.to_html(),
    );

    document("Your Report", REPORT_STYLE, &body)
}

/// Datastore-backed report
///
/// The stored body is embedded verbatim; everything else is escaped.
pub fn stored_report_page(row: &ReportRow, email: &str, done: &DoneAction) -> String {
    let heading = row.full_name.as_deref().filter(|name| !name.is_empty());
    let content = row.content().unwrap_or_default();

    let mut info = String::new();
    if let Some(name) = heading {
        info.push_str(&format!(
            "<p><strong>Name:</strong> {}</p>\n",
            encode_text(name)
        ));
    }
    if let Some(company) = row.company.as_deref().filter(|c| !c.is_empty()) {
        info.push_str(&format!(
            "<p><strong>Company:</strong> {}</p>\n",
            encode_text(company)
        ));
    }
    info.push_str(&format!(
        "<p><strong>Email:</strong> {}</p>\n",
        encode_text(email)
    ));
    if let Some(kind) = row.report_type.as_deref().filter(|k| !k.is_empty()) {
        info.push_str(&format!(
            "<p><strong>Report type:</strong> {}</p>\n",
            encode_text(kind)
        ));
    }
    if let Some(created) = row.created_at.as_deref().filter(|c| !c.is_empty()) {
        info.push_str(&format!(
            "<p><strong>Created:</strong> {}</p>\n",
            encode_text(created)
        ));
    }

    let body = format!(
        "<div class=\"report-container\">\n\
         <h1>Your Report</h1>\n\
         <div class=\"user-info\">\n{info}</div>\n\
         <div class=\"report-content\">\n{content}\n</div>\n\
         {done}\n\
         </div>",
        done = done.to_html(),
    );

    document("Your Report", REPORT_STYLE, &body)
}
