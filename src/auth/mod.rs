//! Authentication
//!
//! Handles:
//! - OpenID Connect login flow (authorization code with PKCE)
//! - Cookie session management
//! - Login-gate middleware

mod middleware;
pub mod oidc;
mod pkce;
pub mod session;

pub use middleware::{CurrentUser, require_login};
pub use oidc::{OidcClient, SsoProvider};
pub use session::{Session, SessionUser, SsoUser, create_session_token, verify_session_token};
