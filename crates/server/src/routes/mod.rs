//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//! GET  /blog                      - Blog index
//! GET  /blog/{slug}               - Blog post
//! GET  /projects                  - Projects page
//! GET  /health                    - Liveness
//! GET  /health/ready              - Readiness (session store ping)
//!
//! # Admin surface
//! GET  /admin                     - Dashboard (login form without a session)
//! GET  /admin/login               - Login form
//!
//! # Admin session API
//! POST /api/admin/login           - Login (JSON or form)
//! GET  /api/admin/validate        - {ok} for the presented token
//! POST /api/admin/sessions        - Seed a per-tab session (protected)
//! POST /api/admin/logout          - Revoke token, clear cookie
//! GET  /api/admin/diagnostics     - 410 Gone (protected)
//!
//! # Settings
//! GET  /api/settings              - Effective settings
//! PUT  /api/settings              - Partial update (protected)
//! GET  /api/settings/audit        - Change log (protected)
//!
//! # Content
//! GET  /api/posts                 - Posts (drafts for admins)
//! POST /api/posts                 - Create post (protected)
//! GET  /api/posts/{slug}          - Post (drafts for admins)
//! GET  /api/projects              - Projects (drafts for admins)
//! POST /api/projects              - Create project (protected)
//! GET  /api/projects/public       - Published projects
//! ```

pub mod admin;
pub mod health;
pub mod pages;
pub mod posts;
pub mod projects;
pub mod settings;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::login_rate_limiter;
use crate::state::AppState;

/// Create the admin session API router.
pub fn admin_api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/login", post(admin::login).layer(login_rate_limiter()))
        .route("/api/admin/validate", get(admin::validate))
        .route("/api/admin/sessions", post(admin::seed_session))
        .route("/api/admin/logout", post(admin::logout))
        .route("/api/admin/diagnostics", get(admin::diagnostics))
}

/// Create the settings API router.
pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/api/settings", get(settings::show).put(settings::update))
        .route("/api/settings/audit", get(settings::audit))
}

/// Create the content API router.
pub fn content_api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/posts", get(posts::index).post(posts::create))
        .route("/api/posts/{slug}", get(posts::show))
        .route("/api/projects", get(projects::index).post(projects::create))
        .route("/api/projects/public", get(projects::public))
}

/// Create the HTML page router.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/blog", get(pages::blog_index))
        .route("/blog/{slug}", get(pages::blog_show))
        .route("/projects", get(pages::projects))
        .route("/admin", get(pages::dashboard))
        .route("/admin/login", get(pages::login_page))
}

/// Build the complete route tree.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(page_routes())
        .merge(admin_api_routes())
        .merge(settings_routes())
        .merge(content_api_routes())
        .fallback(pages::not_found)
}
