//! Persistence for sessions, settings and content.
//!
//! Each concern sits behind an `async_trait` store so the server can run on
//! `PostgreSQL` in production and on in-memory maps in development and tests.
//!
//! # Database: `folio` schema
//!
//! ## Tables
//!
//! - `admin_session` - Active admin tokens, keyed by token (many per identity)
//! - `site_settings` - Singleton row of feature toggles (JSONB)
//! - `settings_audit` - Append-only log of settings changes
//! - `post` - Blog posts (drafts included)
//! - `project` - Portfolio projects (drafts included)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p folio-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_core::{
    AdminToken, Post, Project, SettingValue, SettingsAuditEntry, SettingsPatch,
};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memory::{MemoryContentStore, MemorySessionStore, MemorySettingsStore};
pub use postgres::{PgContentStore, PgSessionStore, PgSettingsStore};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g. duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A persisted admin session.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AdminSession {
    pub token: AdminToken,
    /// The admin email the session was issued to.
    pub admin_identity: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    /// Whether the session has expired at `now`.
    ///
    /// A session is still valid at exactly `expires_at`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Stored settings row, before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredSettings {
    pub flags: BTreeMap<String, SettingValue>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

/// Session records keyed by token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session.
    async fn insert(&self, session: &AdminSession) -> Result<(), StoreError>;

    /// Look up a session by token, expired or not.
    async fn find(&self, token: &AdminToken) -> Result<Option<AdminSession>, StoreError>;

    /// Delete a session. Returns whether a record was removed.
    async fn delete(&self, token: &AdminToken) -> Result<bool, StoreError>;

    /// Delete every session that expired before `now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Delete every session.
    async fn delete_all(&self) -> Result<u64, StoreError>;

    /// Check the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// The singleton settings document and its audit log.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the stored settings, `None` if never written.
    async fn load(&self) -> Result<Option<StoredSettings>, StoreError>;

    /// Merge `patch` into the stored settings (creating the row if needed)
    /// and append an audit entry, atomically.
    async fn apply(
        &self,
        patch: &SettingsPatch,
        audit: &SettingsAuditEntry,
    ) -> Result<StoredSettings, StoreError>;

    /// Most recent audit entries, newest first.
    async fn recent_audit(&self, limit: u32) -> Result<Vec<SettingsAuditEntry>, StoreError>;
}

/// Posts and projects.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Posts, newest first. Drafts only when `include_drafts`.
    async fn list_posts(&self, include_drafts: bool) -> Result<Vec<Post>, StoreError>;

    /// A post by slug, drafts included.
    async fn find_post(&self, slug: &str) -> Result<Option<Post>, StoreError>;

    /// Insert a post; fails with [`StoreError::Conflict`] on a duplicate slug.
    async fn insert_post(&self, post: &Post) -> Result<(), StoreError>;

    /// Projects by position. Drafts only when `include_drafts`.
    async fn list_projects(&self, include_drafts: bool) -> Result<Vec<Project>, StoreError>;

    /// Insert a project, returning it with its assigned id.
    async fn insert_project(&self, project: &Project) -> Result<Project, StoreError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url.expose_secret())
        .await
}

/// Apply pending migrations from `crates/server/migrations`.
///
/// # Errors
///
/// Returns an error if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
