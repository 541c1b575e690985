//! Public HTML pages and the admin login surface.
//!
//! Public pages show published content only and honour the `showBlog` and
//! `showProjects` toggles. The admin dashboard links to public pages with
//! the `admin_view` handoff flag so a preview tab can pick them up.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use folio_core::handoff::handoff_url;
use folio_core::settings::{SHOW_BLOG, SHOW_PROJECTS};
use folio_core::{Email, Post, Project, SettingValue, SiteSettings};
use tracing::instrument;
use url::Url;

use crate::error::{AppError, Result};
use crate::middleware::OptionalAdmin;
use crate::state::AppState;

/// Number of recent posts on the home page.
const RECENT_POSTS_COUNT: usize = 3;

/// Post view for templates.
#[derive(Clone)]
pub struct PostView {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub published_on: String,
}

impl From<&Post> for PostView {
    fn from(post: &Post) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            content: post.content.clone(),
            published_on: post.created_at.format("%B %-d, %Y").to_string(),
        }
    }
}

/// Project view for templates.
#[derive(Clone)]
pub struct ProjectView {
    pub title: String,
    pub summary: String,
    pub url: Option<String>,
}

impl From<&Project> for ProjectView {
    fn from(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            summary: project.summary.clone(),
            url: project.url.clone(),
        }
    }
}

/// A settings row on the dashboard.
pub struct SettingView {
    pub key: String,
    pub value: String,
}

/// A preview link on the dashboard.
pub struct PreviewLink {
    pub label: &'static str,
    pub href: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub show_blog: bool,
    pub show_projects: bool,
    pub recent_posts: Vec<PostView>,
}

/// Blog index page template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/index.html")]
pub struct BlogIndexTemplate {
    pub posts: Vec<PostView>,
}

/// Blog post detail template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/show.html")]
pub struct BlogShowTemplate {
    pub post: PostView,
}

/// Projects page template.
#[derive(Template, WebTemplate)]
#[template(path = "projects.html")]
pub struct ProjectsTemplate {
    pub projects: Vec<ProjectView>,
}

/// Shown when a section is switched off in the settings.
#[derive(Template, WebTemplate)]
#[template(path = "feature_disabled.html")]
pub struct FeatureDisabledTemplate {
    pub feature: &'static str,
}

/// Not found page template.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate;

/// Admin login page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    /// Masked admin identity.
    pub admin: String,
    pub expires_at: String,
    pub maintenance_mode: bool,
    pub settings: Vec<SettingView>,
    pub preview_links: Vec<PreviewLink>,
}

// =============================================================================
// Public pages
// =============================================================================

/// `GET /`
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<Response> {
    let settings = state.settings().get_or_default().await;
    let show_blog = settings.is_enabled(SHOW_BLOG);

    let recent_posts = if show_blog {
        state
            .content()
            .list_posts(false)
            .await?
            .iter()
            .take(RECENT_POSTS_COUNT)
            .map(PostView::from)
            .collect()
    } else {
        Vec::new()
    };

    Ok(HomeTemplate {
        show_blog,
        show_projects: settings.is_enabled(SHOW_PROJECTS),
        recent_posts,
    }
    .into_response())
}

/// `GET /blog`
#[instrument(skip(state))]
pub async fn blog_index(State(state): State<AppState>) -> Result<Response> {
    if !state.settings().get_or_default().await.is_enabled(SHOW_BLOG) {
        return Ok(feature_disabled("The blog"));
    }

    let posts = state.content().list_posts(false).await?;
    Ok(BlogIndexTemplate {
        posts: posts.iter().map(PostView::from).collect(),
    }
    .into_response())
}

/// `GET /blog/{slug}`
#[instrument(skip(state))]
pub async fn blog_show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response> {
    if !state.settings().get_or_default().await.is_enabled(SHOW_BLOG) {
        return Ok(feature_disabled("The blog"));
    }

    match state.content().find_post(&slug).await? {
        Some(post) if post.published => Ok(BlogShowTemplate {
            post: PostView::from(&post),
        }
        .into_response()),
        _ => Ok((StatusCode::NOT_FOUND, NotFoundTemplate).into_response()),
    }
}

/// `GET /projects`
#[instrument(skip(state))]
pub async fn projects(State(state): State<AppState>) -> Result<Response> {
    if !state.settings().get_or_default().await.is_enabled(SHOW_PROJECTS) {
        return Ok(feature_disabled("Projects"));
    }

    let projects = state.content().list_projects(false).await?;
    Ok(ProjectsTemplate {
        projects: projects.iter().map(ProjectView::from).collect(),
    }
    .into_response())
}

/// Fallback for unknown pages.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, NotFoundTemplate)
}

fn feature_disabled(feature: &'static str) -> Response {
    (StatusCode::NOT_FOUND, FeatureDisabledTemplate { feature }).into_response()
}

// =============================================================================
// Admin login surface
// =============================================================================

/// `GET /admin/login`
pub async fn login_page(admin: OptionalAdmin) -> Response {
    if admin.is_admin() {
        return Redirect::to("/admin").into_response();
    }
    LoginTemplate { error: None }.into_response()
}

/// `GET /admin` - dashboard for a validated admin, login form otherwise.
#[instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    OptionalAdmin(session): OptionalAdmin,
) -> Result<Response> {
    let Some(session) = session else {
        return Ok(LoginTemplate { error: None }.into_response());
    };

    let settings = state.settings().get_or_default().await;
    let base = Url::parse(&state.config().base_url)
        .map_err(|e| AppError::Internal(format!("invalid base URL: {e}")))?;

    let mut preview_links = Vec::new();
    for (label, path) in [("Home", "/"), ("Blog", "/blog"), ("Projects", "/projects")] {
        let url = handoff_url(&base, path, None)
            .map_err(|e| AppError::Internal(format!("invalid preview link: {e}")))?;
        preview_links.push(PreviewLink {
            label,
            href: url.to_string(),
        });
    }

    let admin = Email::parse(&session.admin_identity)
        .map_or_else(|_| "admin".to_string(), |email| email.masked());

    Ok(DashboardTemplate {
        admin,
        expires_at: session.expires_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        maintenance_mode: settings.maintenance_mode(),
        settings: setting_views(&settings),
        preview_links,
    }
    .into_response())
}

fn setting_views(settings: &SiteSettings) -> Vec<SettingView> {
    settings
        .flags
        .iter()
        .map(|(key, value)| SettingView {
            key: key.clone(),
            value: match value {
                SettingValue::Bool(true) => "on".to_string(),
                SettingValue::Bool(false) => "off".to_string(),
                SettingValue::Text(text) => text.clone(),
            },
        })
        .collect()
}
