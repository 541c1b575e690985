//! Portfolio project API.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use folio_core::Project;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::{OptionalAdmin, RequireAdmin};
use crate::state::AppState;

/// Longest accepted project title.
const MAX_TITLE_LENGTH: usize = 200;

/// Body of a project creation request.
#[derive(Debug, Deserialize)]
pub struct NewProject {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub position: i32,
}

/// `GET /api/projects` - drafts included for a validated admin.
pub async fn index(
    State(state): State<AppState>,
    admin: OptionalAdmin,
) -> Result<Json<Vec<Project>>> {
    let projects = state.content().list_projects(admin.is_admin()).await?;
    Ok(Json(projects))
}

/// `GET /api/projects/public` - published projects only, whoever asks.
pub async fn public(State(state): State<AppState>) -> Result<Json<Vec<Project>>> {
    let projects = state.content().list_projects(false).await?;
    Ok(Json(projects))
}

/// `POST /api/projects`
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    payload: std::result::Result<Json<NewProject>, JsonRejection>,
) -> Result<(StatusCode, Json<Project>)> {
    let Json(new) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let title = new.title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::BadRequest(format!(
            "title must be 1-{MAX_TITLE_LENGTH} characters"
        )));
    }

    let project = Project {
        id: 0,
        title: title.to_owned(),
        summary: new.summary,
        url: new.url.filter(|u| !u.trim().is_empty()),
        published: new.published,
        position: new.position,
        created_at: state.clock().now(),
    };
    let project = state.content().insert_project(&project).await?;
    tracing::info!(id = project.id, published = project.published, "project created");

    Ok((StatusCode::CREATED, Json(project)))
}
