//! HTTP client for the Folio admin session API and public reads.
//!
//! The session client keeps a cookie store, so a successful login also gives
//! it the whole-browser `admin_token` cookie. Per-tab tokens are sent
//! explicitly in the `x-admin-token` header. Anonymous reads go through a
//! second client that never stores or sends cookies.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_core::{AdminToken, SiteSettings};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use crate::error::ClientError;
use crate::tab::SessionApi;

/// Header carrying a per-tab admin token.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// A session returned by login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginSession {
    /// Masked admin identity.
    pub admin: String,
    #[serde(rename = "admin_token")]
    pub token: AdminToken,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

/// A per-tab session returned by the seed endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuedToken {
    #[serde(rename = "admin_token")]
    pub token: AdminToken,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct ValidateResponse {
    ok: bool,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Client for one Folio origin.
#[derive(Debug, Clone)]
pub struct AdminClient {
    client: Client,
    anonymous: Client,
    base_url: Url,
}

impl AdminClient {
    /// Create a client for the site at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(base_url: Url) -> Result<Self, ClientError> {
        let client = Client::builder().cookie_store(true).build()?;
        let anonymous = Client::builder().build()?;
        Ok(Self {
            client,
            anonymous,
            base_url,
        })
    }

    /// The site this client talks to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sign in. The server also sets the session cookie on this client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` for wrong credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession, ClientError> {
        let response = self
            .client
            .post(self.url("/api/admin/login")?)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let session: LoginSession = check(response).await?.json().await?;
        debug!(token_prefix = session.token.prefix(), "admin login succeeded");
        Ok(session)
    }

    /// Ask whether `token` (or, without one, the cookie) is a live session.
    ///
    /// # Errors
    ///
    /// Returns error for transport failures and statuses other than 200/401.
    pub async fn validate(&self, token: Option<&AdminToken>) -> Result<bool, ClientError> {
        let request = self.client.get(self.url("/api/admin/validate")?);
        let response = with_token(request, token).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(false);
        }
        let body: ValidateResponse = check(response).await?.json().await?;
        Ok(body.ok)
    }

    /// Obtain a new, independent per-tab token.
    ///
    /// Authorized by `token` when given, otherwise by the session cookie.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` when neither credential is valid.
    #[instrument(skip_all)]
    pub async fn seed(&self, token: Option<&AdminToken>) -> Result<IssuedToken, ClientError> {
        let request = self.client.post(self.url("/api/admin/sessions")?);
        let response = with_token(request, token).send().await?;

        let issued: IssuedToken = check(response).await?.json().await?;
        debug!(token_prefix = issued.token.prefix(), "per-tab session seeded");
        Ok(issued)
    }

    /// Revoke `token` (or the cookie session) and drop the cookie.
    ///
    /// # Errors
    ///
    /// Returns error only for transport failures or a server error; an
    /// unknown token is not an error.
    pub async fn logout(&self, token: Option<&AdminToken>) -> Result<(), ClientError> {
        let request = self.client.post(self.url("/api/admin/logout")?);
        check(with_token(request, token).send().await?).await?;
        Ok(())
    }

    /// Effective site settings.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn settings(&self) -> Result<SiteSettings, ClientError> {
        self.get_anonymous("/api/settings").await
    }

    /// GET `path` as a visitor without any admin credential.
    ///
    /// # Errors
    ///
    /// Returns error for transport failures, non-success statuses and bodies
    /// that do not decode as `T`.
    pub async fn get_anonymous<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.anonymous.get(self.url(path)?).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// GET `path` with this browser's cookie and, when given, `token`.
    ///
    /// # Errors
    ///
    /// Returns error for transport failures, non-success statuses and bodies
    /// that do not decode as `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&AdminToken>,
    ) -> Result<T, ClientError> {
        let request = self.client.get(self.url(path)?);
        let response = with_token(request, token).send().await?;
        Ok(check(response).await?.json().await?)
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }
}

#[async_trait]
impl SessionApi for AdminClient {
    async fn validate(&self, token: Option<&AdminToken>) -> Result<bool, ClientError> {
        Self::validate(self, token).await
    }

    async fn seed(&self, token: Option<&AdminToken>) -> Result<IssuedToken, ClientError> {
        Self::seed(self, token).await
    }

    async fn logout(&self, token: Option<&AdminToken>) -> Result<(), ClientError> {
        Self::logout(self, token).await
    }
}

fn with_token(request: RequestBuilder, token: Option<&AdminToken>) -> RequestBuilder {
    match token {
        Some(token) => request.header(ADMIN_TOKEN_HEADER, token.as_str()),
        None => request,
    }
}

/// Map a non-success response onto `ClientError`.
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
        StatusCode::SERVICE_UNAVAILABLE => Err(ClientError::Maintenance),
        StatusCode::NOT_FOUND => Err(ClientError::NotFound(response.url().path().to_owned())),
        _ => {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map_or_else(|_| status.to_string(), |body| body.error);
            Err(ClientError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}
