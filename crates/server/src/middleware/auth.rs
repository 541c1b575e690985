//! Admin extractors for route handlers.
//!
//! The gate only checks that a protected request carries a token. Handlers
//! that act on behalf of the admin take [`RequireAdmin`], which validates the
//! token against the Session Store (failing closed) and hands over the
//! session record.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use folio_core::AdminToken;
use serde_json::json;

use super::gate::wants_html;
use super::token::{ADMIN_TOKEN_HEADER, extract_token};
use crate::state::AppState;
use crate::store::AdminSession;

/// Extractor that requires a validated admin session.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(session): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", session.admin_identity)
/// }
/// ```
pub struct RequireAdmin(pub AdminSession);

/// Error returned when a validated admin session is required but missing.
pub enum AdminAuthRejection {
    /// Redirect to the login page (browser navigation).
    RedirectToLogin,
    /// 401 with a JSON body (API callers).
    Unauthorized,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/admin/login").into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized" })),
            )
                .into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = match extract_token(&parts.headers) {
            Some(token) => state.sessions().authorize(&token).await,
            None => None,
        };

        session.map(Self).ok_or_else(|| {
            let is_api = parts.uri.path().starts_with("/api/");
            if !is_api && wants_html(&parts.headers) {
                AdminAuthRejection::RedirectToLogin
            } else {
                AdminAuthRejection::Unauthorized
            }
        })
    }
}

/// Extractor that optionally gets the validated admin session.
///
/// Public reads use it to decide whether drafts are visible. Anonymous
/// callers and stale cookies read as "no admin". A token sent in the
/// `x-admin-token` header is an explicit request for the admin view, so a
/// header token that does not validate is rejected with 401 instead of being
/// silently downgraded; the preview client reseeds on that answer.
pub struct OptionalAdmin(pub Option<AdminSession>);

impl OptionalAdmin {
    /// Whether a validated admin is present.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.0.is_some()
    }
}

impl FromRequestParts<AppState> for OptionalAdmin {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_token(&parts.headers) else {
            return Ok(Self(None));
        };

        match state.sessions().authorize(&token).await {
            Some(session) => Ok(Self(Some(session))),
            None if parts.headers.contains_key(ADMIN_TOKEN_HEADER) => {
                Err(AdminAuthRejection::Unauthorized)
            }
            None => Ok(Self(None)),
        }
    }
}

/// Extractor for the presented token, valid or not.
///
/// Used by logout and validate, which handle unknown tokens themselves.
pub struct PresentedToken(pub Option<AdminToken>);

impl<S> FromRequestParts<S> for PresentedToken
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(extract_token(&parts.headers)))
    }
}
