//! Hosted datastore fetcher
//!
//! Reads report rows through the datastore's REST surface
//! (PostgREST-style): a single-row filtered query, equality-matched on
//! email. The single-object `Accept` header makes the backend's
//! distinct "no rows found" error code observable, so a missing row
//! maps to 404 while every other failure maps to 500.

use axum::http::header;
use serde::Deserialize;

use crate::config::DatastoreConfig;
use crate::error::AppError;

/// Backend error code for "no rows returned by a single-object request"
const NO_ROWS_CODE: &str = "PGRST116";

/// Client for the hosted datastore's REST interface
#[derive(Debug, Clone)]
pub struct DatastoreClient {
    http: reqwest::Client,
    url: Option<String>,
    api_key: Option<String>,
    table: String,
}

/// One report row, as stored upstream
///
/// All fields optional: which ones a deployment populates varies, and
/// a row missing its content field is "not yet ready" rather than an
/// error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportRow {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub report_html: Option<String>,
    #[serde(default)]
    pub html_content: Option<String>,
    #[serde(default)]
    pub report_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ReportRow {
    /// Renderable report body: `report_html`, else `html_content`
    pub fn content(&self) -> Option<&str> {
        self.report_html
            .as_deref()
            .filter(|html| !html.trim().is_empty())
            .or_else(|| {
                self.html_content
                    .as_deref()
                    .filter(|html| !html.trim().is_empty())
            })
    }
}

/// Error body shape returned by the REST surface
#[derive(Debug, Deserialize)]
struct DatastoreErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl DatastoreClient {
    pub fn new(http: reqwest::Client, config: &DatastoreConfig) -> Self {
        Self {
            http,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            table: config.table.clone(),
        }
    }

    /// Fetch the report row for an email address
    ///
    /// With `latest`, the query orders by `created_at` descending and
    /// takes one row, disambiguating when an address has several.
    ///
    /// # Errors
    /// `Config` when the URL or key is absent, `ReportNotFound` on the
    /// backend's no-rows code, `Upstream` on any other non-2xx.
    pub async fn fetch_report(&self, email: &str, latest: bool) -> Result<ReportRow, AppError> {
        let base = self
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AppError::Config("datastore.url is not configured".to_string()))?;
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::Config("datastore.api_key is not configured".to_string()))?;

        let endpoint = format!("{}/rest/v1/{}", base.trim_end_matches('/'), self.table);
        let mut query: Vec<(&str, String)> = vec![
            ("select", "*".to_string()),
            ("email", format!("eq.{email}")),
        ];
        if latest {
            query.push(("order", "created_at.desc".to_string()));
            query.push(("limit", "1".to_string()));
        }

        let response = self
            .http
            .get(&endpoint)
            .query(&query)
            .header("apikey", api_key)
            .bearer_auth(api_key)
            .header(header::ACCEPT, "application/vnd.pgrst.object+json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return response.json::<ReportRow>().await.map_err(AppError::from);
        }

        let body = response.text().await.unwrap_or_default();
        if let Ok(error) = serde_json::from_str::<DatastoreErrorBody>(&body) {
            if error.code.as_deref() == Some(NO_ROWS_CODE) {
                return Err(AppError::ReportNotFound);
            }
            if let Some(message) = error.message.filter(|m| !m.is_empty()) {
                return Err(AppError::Upstream(format!(
                    "datastore returned {}: {}",
                    status.as_u16(),
                    message
                )));
            }
        }

        Err(AppError::Upstream(format!(
            "datastore returned {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )))
    }
}
