//! Blog post API.
//!
//! Anonymous callers see published posts only. A caller whose token the
//! Session Store validates also sees drafts; this is what the admin preview
//! reads.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use folio_core::{NewPost, Post};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::{OptionalAdmin, RequireAdmin};
use crate::state::AppState;

/// `GET /api/posts` - newest first.
pub async fn index(
    State(state): State<AppState>,
    admin: OptionalAdmin,
) -> Result<Json<Vec<Post>>> {
    let posts = state.content().list_posts(admin.is_admin()).await?;
    Ok(Json(posts))
}

/// `GET /api/posts/{slug}` - drafts are 404 unless the caller is an admin.
pub async fn show(
    State(state): State<AppState>,
    admin: OptionalAdmin,
    Path(slug): Path<String>,
) -> Result<Json<Post>> {
    let post = state
        .content()
        .find_post(&slug)
        .await?
        .filter(|post| post.published || admin.is_admin())
        .ok_or_else(|| AppError::NotFound(format!("post {slug}")))?;
    Ok(Json(post))
}

/// `POST /api/posts`
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    payload: std::result::Result<Json<NewPost>, JsonRejection>,
) -> Result<(StatusCode, Json<Post>)> {
    let Json(new_post) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let post = new_post
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?
        .into_post(state.clock().now());

    state.content().insert_post(&post).await?;
    tracing::info!(slug = %post.slug, published = post.published, "post created");

    Ok((StatusCode::CREATED, Json(post)))
}
