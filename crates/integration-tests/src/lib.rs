//! Integration tests for Folio.
//!
//! Every test starts its own in-process server on `127.0.0.1:0` with
//! in-memory stores and a manual clock, then drives it over real HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p folio-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use folio_core::{AdminToken, Email};
use folio_server::clock::ManualClock;
use folio_server::config::{AdminConfig, ServerConfig};
use folio_server::services::auth::hash_password;
use folio_server::{AppState, Stores, build_router};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

/// Admin email configured on every test server.
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Admin password configured on every test server.
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

/// Header carrying a per-tab admin token.
pub const TOKEN_HEADER: &str = "x-admin-token";

/// A running server plus handles into its state.
pub struct TestServer {
    pub base_url: Url,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with in-memory stores.
    pub async fn spawn() -> Self {
        let config = ServerConfig {
            admin: AdminConfig {
                email: Some(Email::parse(ADMIN_EMAIL).expect("valid admin email")),
                password_hash: Some(SecretString::from(
                    hash_password(ADMIN_PASSWORD).expect("Failed to hash password"),
                )),
            },
            ..ServerConfig::default()
        };

        let clock = Arc::new(ManualClock::default());
        let state = AppState::with_clock(config, Stores::in_memory(), clock.clone());
        let app = build_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .expect("Test server failed");
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}/")).expect("valid base URL"),
            state,
            clock,
            handle,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> Url {
        self.base_url.join(path).expect("valid path")
    }

    /// A plain client without a cookie store.
    #[must_use]
    pub fn anonymous() -> Client {
        Client::new()
    }

    /// Log in over JSON and return the issued token.
    pub async fn login(&self, client: &Client) -> AdminToken {
        let response = client
            .post(self.url("/api/admin/login"))
            .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .send()
            .await
            .expect("Failed to send login");
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await.expect("Failed to read login body");
        AdminToken::parse(body["admin_token"].as_str().expect("token in body"))
            .expect("well-formed token")
    }

    /// Create a post as the admin behind `token`.
    pub async fn create_post(&self, token: &AdminToken, slug: &str, published: bool) {
        let response = with_token(Self::anonymous().post(self.url("/api/posts")), token)
            .json(&json!({ "slug": slug, "title": slug, "published": published }))
            .send()
            .await
            .expect("Failed to create post");
        assert_eq!(response.status(), 201);
    }

    /// Turn maintenance mode on or off.
    pub async fn set_maintenance(&self, token: &AdminToken, on: bool) -> Response {
        with_token(Self::anonymous().put(self.url("/api/settings")), token)
            .json(&json!({ "maintenanceMode": on }))
            .send()
            .await
            .expect("Failed to update settings")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Attach `token` as the per-tab header.
#[must_use]
pub fn with_token(request: RequestBuilder, token: &AdminToken) -> RequestBuilder {
    request.header(TOKEN_HEADER, token.as_str())
}
