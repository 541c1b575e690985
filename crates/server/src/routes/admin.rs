//! Admin session endpoints: login, validate, per-tab seed and logout.

use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::gate::wants_html;
use crate::middleware::{PresentedToken, RequireAdmin, clear_session_cookie, session_cookie};
use crate::routes::pages::LoginTemplate;
use crate::services::{AuthError, IssuedSession};
use crate::state::AppState;

/// Login body, accepted as JSON or form-encoded.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default, alias = "identity")]
    pub email: Option<String>,
    #[serde(default, alias = "secret")]
    pub password: Option<String>,
}

impl LoginRequest {
    /// Both fields, trimmed identity, or `None` if either is missing or blank.
    fn credentials(&self) -> Option<(&str, &str)> {
        let email = self.email.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let password = self.password.as_deref().filter(|s| !s.is_empty())?;
        Some((email, password))
    }
}

/// Successful JSON login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: &'static str,
    /// Masked admin identity.
    pub admin: String,
    #[serde(flatten)]
    pub session: IssuedSession,
}

/// A freshly seeded per-tab session.
#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub success: bool,
    #[serde(flatten)]
    pub session: IssuedSession,
}

/// `POST /api/admin/login`
///
/// On success the session token is set as the `admin_token` cookie and also
/// returned in the body for per-tab use. A browser form submit is answered
/// with a redirect to `/admin`.
#[instrument(skip_all)]
pub async fn login(State(state): State<AppState>, jar: CookieJar, request: Request) -> Response {
    let html = wants_html(request.headers());

    let body = match parse_login(request).await {
        Ok(body) => body,
        Err(e) => return e.into_response(),
    };
    let Some((identity, secret)) = body.credentials() else {
        return login_failure(
            html,
            AppError::BadRequest("Email and password are required".to_string()),
        );
    };

    let admin = match state.auth().authenticate(identity, secret) {
        Ok(admin) => admin,
        Err(e) => return login_failure(html, e.into()),
    };

    let issued = match state.sessions().create(admin.as_str()).await {
        Ok(issued) => issued,
        Err(e) => return AppError::from(e).into_response(),
    };

    let cookie = session_cookie(
        &issued.token,
        state.sessions().ttl().num_seconds(),
        state.config().secure_cookies(),
    );
    let jar = jar.add(cookie);

    if html {
        return (jar, Redirect::to("/admin")).into_response();
    }

    (
        jar,
        Json(LoginResponse {
            success: true,
            message: "Login successful",
            admin: admin.masked(),
            session: issued,
        }),
    )
        .into_response()
}

/// Decode the login body according to its content type.
async fn parse_login(request: Request) -> Result<LoginRequest> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        let Json(body) = Json::<LoginRequest>::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(body)
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(body) = Form::<LoginRequest>::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(body)
    } else {
        Err(AppError::BadRequest(
            "Expected a JSON or form-encoded body".to_string(),
        ))
    }
}

fn login_failure(html: bool, error: AppError) -> Response {
    if html && !matches!(error, AppError::Auth(AuthError::Misconfigured(_))) {
        let status = error.status();
        return (
            status,
            LoginTemplate {
                error: Some(error.message()),
            },
        )
            .into_response();
    }
    error.into_response()
}

/// `GET /api/admin/validate` - `{ok: true}` for a live session, 401 otherwise.
pub async fn validate(
    State(state): State<AppState>,
    PresentedToken(token): PresentedToken,
) -> Response {
    let valid = match token {
        Some(token) => state.sessions().is_valid(&token).await,
        None => false,
    };

    if valid {
        Json(json!({ "ok": true })).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "ok": false }))).into_response()
    }
}

/// `POST /api/admin/sessions` - issue an independent token for a new tab.
///
/// Authorized by any live session (header or cookie); the new session is
/// issued to the same admin identity.
#[instrument(skip_all)]
pub async fn seed_session(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
) -> Result<Json<SeedResponse>> {
    let issued = state.sessions().create(&session.admin_identity).await?;
    tracing::info!(
        parent_prefix = session.token.prefix(),
        token_prefix = issued.token.prefix(),
        "per-tab admin session seeded"
    );

    Ok(Json(SeedResponse {
        success: true,
        session: issued,
    }))
}

/// `POST /api/admin/logout`
///
/// Revokes the presented token and clears the cookie. Always succeeds:
/// a missing, unknown or already revoked token is fine.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    PresentedToken(token): PresentedToken,
    request: Request,
) -> Response {
    if let Some(token) = token {
        if let Err(e) = state.sessions().revoke(&token).await {
            tracing::error!(
                error = %e,
                token_prefix = token.prefix(),
                "failed to revoke admin session"
            );
        }
    }

    let jar = jar.add(clear_session_cookie(state.config().secure_cookies()));

    if wants_html(request.headers()) {
        return (jar, Redirect::to("/admin/login")).into_response();
    }
    (jar, Json(json!({ "success": true }))).into_response()
}

/// `GET /api/admin/diagnostics` - intentionally disabled.
pub async fn diagnostics(RequireAdmin(_): RequireAdmin) -> AppError {
    AppError::Gone("Diagnostics disabled")
}
