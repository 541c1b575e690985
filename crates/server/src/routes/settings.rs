//! Site settings API.
//!
//! Reads are public; writes require a validated admin and merge only the
//! supplied keys. Responses are never cached.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, header::CACHE_CONTROL},
    response::{IntoResponse, Response},
};
use folio_core::{Email, SettingsAuditEntry, SettingsPatch, SiteSettings};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// `GET /api/settings`
pub async fn show(State(state): State<AppState>) -> Result<Response> {
    let settings = state.settings().get().await?;
    Ok(no_store(Json(settings)))
}

/// `PUT /api/settings` - partial update.
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    payload: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let patch = SettingsPatch::from_json(&body).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let admin = Email::parse(&session.admin_identity).map_err(|_| {
        AppError::Internal("session admin identity is not an email".to_string())
    })?;

    let settings: SiteSettings = state.settings().update(&patch, &admin).await?;
    Ok(no_store(Json(settings)))
}

/// `GET /api/settings/audit` - recent changes, newest first.
pub async fn audit(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Response> {
    let entries: Vec<SettingsAuditEntry> = state.settings().audit_log().await?;
    Ok(no_store(Json(entries)))
}

fn no_store(body: impl IntoResponse) -> Response {
    let mut response = body.into_response();
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
