//! API layer
//!
//! HTTP handlers for:
//! - Landing page and liveness probe
//! - The `/report` flow, one handler per variant
//! - The OIDC login flow

mod login;
mod pages;
mod report;

pub use login::{callback, done, login};
pub use pages::{healthz, landing};
pub use report::{crm_report, datastore_report, sso_report};
