//! CRM contact fetcher
//!
//! One outbound GET per report request: the contacts endpoint of the
//! member CRM, authorized with a private bearer token and a pinned API
//! version header.

use axum::http::header;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::CrmConfig;
use crate::error::AppError;

/// Client for the CRM contacts API
#[derive(Debug, Clone)]
pub struct CrmClient {
    http: reqwest::Client,
    api_base: String,
    private_token: Option<String>,
    api_version: String,
}

/// Contact subset rendered into the report and stored in the session
///
/// Every field has a fallback default so a partially populated CRM
/// record never fails projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberProfile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl MemberProfile {
    /// Project the CRM response body into a profile
    ///
    /// Reads `contact.*` fields with per-field defaults; `fallback_id`
    /// is the identifier the caller supplied, used when the record
    /// carries none.
    pub fn from_contact_payload(data: &Value, fallback_id: &str) -> Self {
        let field = |name: &str, default: &str| -> String {
            data["contact"][name]
                .as_str()
                .filter(|value| !value.is_empty())
                .unwrap_or(default)
                .to_string()
        };

        Self {
            id: field("id", fallback_id),
            first_name: field("firstName", "Member"),
            last_name: field("lastName", ""),
            email: field("email", "Not provided"),
            phone: field("phone", "Not provided"),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl CrmClient {
    pub fn new(http: reqwest::Client, config: &CrmConfig) -> Self {
        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            private_token: config.private_token.clone(),
            api_version: config.api_version.clone(),
        }
    }

    /// Fetch a contact by ID
    ///
    /// # Errors
    /// `Config` when the private token is absent, `ReportNotFound`
    /// when the API reports no such contact, `Upstream` carrying
    /// status and reason on any other non-2xx response.
    pub async fn fetch_contact(&self, contact_id: &str) -> Result<MemberProfile, AppError> {
        let token = self
            .private_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AppError::Config("crm.private_token is not configured".to_string())
            })?;

        let url = format!("{}/contacts/{}", self.api_base, contact_id);
        let response = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(token)
            .header("Version", &self.api_version)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::ReportNotFound);
        }
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "API returned {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let data: Value = response.json().await?;
        Ok(MemberProfile::from_contact_payload(&data, contact_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn projection_reads_nested_contact_fields() {
        let data = json!({
            "contact": {
                "id": "c-1",
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@example.com",
                "phone": "555-0100"
            }
        });

        let profile = MemberProfile::from_contact_payload(&data, "fallback");
        assert_eq!(profile.id, "c-1");
        assert_eq!(profile.first_name, "Ada");
        assert_eq!(profile.full_name(), "Ada Lovelace");
        assert_eq!(profile.email, "ada@example.com");
    }

    #[test]
    fn projection_applies_defaults_on_partial_record() {
        let data = json!({ "contact": { "firstName": "Ada" } });

        let profile = MemberProfile::from_contact_payload(&data, "c-42");
        assert_eq!(profile.id, "c-42");
        assert_eq!(profile.first_name, "Ada");
        assert_eq!(profile.last_name, "");
        assert_eq!(profile.email, "Not provided");
        assert_eq!(profile.phone, "Not provided");
        assert_eq!(profile.full_name(), "Ada");
    }

    #[test]
    fn projection_survives_missing_contact_object() {
        let data = json!({ "unexpected": true });

        let profile = MemberProfile::from_contact_payload(&data, "c-7");
        assert_eq!(profile.id, "c-7");
        assert_eq!(profile.first_name, "Member");
    }
}
