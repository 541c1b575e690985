//! Authorization gate applied to every request.
//!
//! Each request is classified by method and path, then checked in two
//! separate steps:
//!
//! 1. **Presence.** Protected API routes need a token in the `x-admin-token`
//!    header or the `admin_token` cookie, or they are rejected with 401.
//!    Validity is checked later by the [`RequireAdmin`] extractor. Project
//!    reads need no token.
//! 2. **Maintenance.** While `maintenanceMode` is on, only a token that the
//!    Session Store validates gets through. API paths get a JSON 503,
//!    documents the maintenance page. Public API and login-surface routes
//!    stay reachable so the admin can sign in and turn the mode off.
//!
//! Failure policy differs per step. A Session Store error reads as "invalid"
//! (fail closed). A settings read that fails or exceeds
//! `maintenance_check_timeout` reads as "maintenance off" (fail open).
//!
//! [`RequireAdmin`]: super::RequireAdmin

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, header::ACCEPT},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::token::extract_token;
use crate::state::AppState;

/// File extensions served without any check.
const ASSET_EXTENSIONS: &[&str] = &["css", "js", "png", "jpg", "jpeg", "svg", "ico", "json"];

/// How the gate treats a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Pre-flight, static assets and health checks: never checked.
    Asset,
    /// Public reads, public comments and the login/validate/logout calls.
    PublicApi,
    /// Public project reads: no token needed, subject to maintenance.
    PublicRead,
    /// The admin login page and dashboard shell.
    LoginSurface,
    /// Every other `/api/` route: a token must be present.
    ProtectedApi,
    /// Public HTML pages: no token needed, subject to maintenance.
    Document,
}

impl RouteClass {
    /// Whether the class stays reachable during maintenance.
    #[must_use]
    pub const fn is_maintenance_exempt(self) -> bool {
        matches!(self, Self::Asset | Self::PublicApi | Self::LoginSurface)
    }
}

/// Classify a request by method and path.
#[must_use]
pub fn classify(method: &Method, path: &str) -> RouteClass {
    if method == Method::OPTIONS || is_asset(path) {
        return RouteClass::Asset;
    }

    if path.starts_with("/api/") || path == "/api" {
        if is_public_api(method, path) {
            return RouteClass::PublicApi;
        }
        if method == Method::GET && under(path, "/api/projects") {
            return RouteClass::PublicRead;
        }
        return RouteClass::ProtectedApi;
    }

    if path == "/admin" || path == "/admin/" || under(path, "/admin/login") {
        return RouteClass::LoginSurface;
    }

    RouteClass::Document
}

fn is_asset(path: &str) -> bool {
    if under(path, "/static") || under(path, "/health") {
        return true;
    }
    if matches!(path, "/favicon.ico" | "/robots.txt" | "/sitemap.xml") {
        return true;
    }
    // Asset-looking API paths still go through the API rules.
    !path.starts_with("/api")
        && path
            .rsplit('/')
            .next()
            .and_then(|segment| segment.rsplit_once('.'))
            .is_some_and(|(_, ext)| ASSET_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn is_public_api(method: &Method, path: &str) -> bool {
    match *method {
        Method::GET => {
            under(path, "/api/posts")
                || under(path, "/api/comments")
                || matches!(path, "/api/settings" | "/api/admin/validate")
        }
        Method::POST => {
            under(path, "/api/comments")
                || matches!(path, "/api/admin/login" | "/api/admin/logout")
        }
        _ => false,
    }
}

/// `path` is `prefix` or lies below it.
fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Maintenance page.
#[derive(Template, WebTemplate)]
#[template(path = "maintenance.html")]
pub struct MaintenanceTemplate;

/// Page shown to a browser that opens a protected route without a token.
#[derive(Template, WebTemplate)]
#[template(path = "unauthorized.html")]
pub struct UnauthorizedTemplate;

/// Gate middleware. Install with `axum::middleware::from_fn_with_state`.
pub async fn gate_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let class = classify(request.method(), path);
    if class == RouteClass::Asset {
        return next.run(request).await;
    }
    let is_api = matches!(
        class,
        RouteClass::PublicApi | RouteClass::PublicRead | RouteClass::ProtectedApi
    );

    // Step 1: presence.
    let token = extract_token(request.headers());
    if class == RouteClass::ProtectedApi && token.is_none() {
        tracing::debug!(path, "protected route without admin token");
        return unauthorized_response(request.headers());
    }

    // Step 2: maintenance, bypassed only by a token that validates.
    if !class.is_maintenance_exempt() && maintenance_active(&state).await {
        let bypass = match &token {
            Some(token) => state.sessions().is_valid(token).await,
            None => false,
        };
        if !bypass {
            tracing::debug!(path, "request blocked by maintenance mode");
            return maintenance_response(is_api);
        }
    }

    next.run(request).await
}

/// Read `maintenanceMode` within the configured budget, failing open.
async fn maintenance_active(state: &AppState) -> bool {
    let budget = state.config().maintenance_check_timeout;
    match tokio::time::timeout(budget, state.settings().maintenance_mode()).await {
        Ok(Ok(active)) => active,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "settings read failed, skipping maintenance check");
            false
        }
        Err(_) => {
            tracing::warn!(
                timeout_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
                "settings read timed out, skipping maintenance check"
            );
            false
        }
    }
}

fn unauthorized_response(headers: &HeaderMap) -> Response {
    if wants_html(headers) {
        (StatusCode::UNAUTHORIZED, UnauthorizedTemplate).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response()
    }
}

fn maintenance_response(is_api: bool) -> Response {
    if is_api {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "Site is in maintenance mode" })),
        )
            .into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, MaintenanceTemplate).into_response()
    }
}

/// Whether the caller is a browser navigating rather than a script.
pub(crate) fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assets_pass_through() {
        for path in [
            "/static/site.css",
            "/favicon.ico",
            "/robots.txt",
            "/health",
            "/health/ready",
            "/images/me.PNG",
        ] {
            assert_eq!(classify(&Method::GET, path), RouteClass::Asset, "{path}");
        }
        assert_eq!(classify(&Method::OPTIONS, "/api/settings"), RouteClass::Asset);
    }

    #[test]
    fn test_public_api() {
        for (method, path) in [
            (Method::GET, "/api/posts"),
            (Method::GET, "/api/posts/hello-world"),
            (Method::GET, "/api/settings"),
            (Method::GET, "/api/comments"),
            (Method::POST, "/api/comments"),
            (Method::POST, "/api/admin/login"),
            (Method::GET, "/api/admin/validate"),
            (Method::POST, "/api/admin/logout"),
        ] {
            assert_eq!(classify(&method, path), RouteClass::PublicApi, "{method} {path}");
        }
    }

    #[test]
    fn test_project_reads_need_no_token_but_honour_maintenance() {
        for path in ["/api/projects", "/api/projects/public"] {
            assert_eq!(classify(&Method::GET, path), RouteClass::PublicRead, "{path}");
        }
        assert_eq!(
            classify(&Method::POST, "/api/projects"),
            RouteClass::ProtectedApi
        );
        assert!(!RouteClass::PublicRead.is_maintenance_exempt());
    }

    #[test]
    fn test_unrouted_api_paths_are_protected() {
        for path in ["/api/testimonials", "/api/search", "/api/stats"] {
            assert_eq!(classify(&Method::GET, path), RouteClass::ProtectedApi, "{path}");
        }
    }

    #[test]
    fn test_protected_api() {
        for (method, path) in [
            (Method::PUT, "/api/settings"),
            (Method::GET, "/api/settings/audit"),
            (Method::POST, "/api/posts"),
            (Method::POST, "/api/admin/sessions"),
            (Method::GET, "/api/admin/diagnostics"),
            (Method::GET, "/api/postsecret"),
            (Method::GET, "/api/data.json"),
        ] {
            assert_eq!(
                classify(&method, path),
                RouteClass::ProtectedApi,
                "{method} {path}"
            );
        }
    }

    #[test]
    fn test_login_surface_and_documents() {
        assert_eq!(classify(&Method::GET, "/admin"), RouteClass::LoginSurface);
        assert_eq!(classify(&Method::GET, "/admin/login"), RouteClass::LoginSurface);
        assert_eq!(classify(&Method::GET, "/admin/settings"), RouteClass::Document);
        assert_eq!(classify(&Method::GET, "/"), RouteClass::Document);
        assert_eq!(classify(&Method::GET, "/blog"), RouteClass::Document);
        assert_eq!(classify(&Method::GET, "/blog/hello"), RouteClass::Document);
    }

    #[test]
    fn test_maintenance_exemptions() {
        assert!(RouteClass::PublicApi.is_maintenance_exempt());
        assert!(RouteClass::LoginSurface.is_maintenance_exempt());
        assert!(!RouteClass::ProtectedApi.is_maintenance_exempt());
        assert!(!RouteClass::PublicRead.is_maintenance_exempt());
        assert!(!RouteClass::Document.is_maintenance_exempt());
    }
}
