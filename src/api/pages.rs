//! Static pages and liveness probe

use axum::response::Html;

use crate::render;

/// GET /
///
/// Informational landing page; no side effects.
pub async fn landing() -> Html<String> {
    Html(render::landing_page())
}

/// GET /healthz
///
/// Liveness probe: fixed body, no dependencies, no outbound calls.
pub async fn healthz() -> &'static str {
    "OK"
}
