//! Admin session maintenance.
//!
//! The server deletes expired sessions lazily and on a timer; `purge` does
//! the same on demand. `revoke-all` signs out every tab at once.
//!
//! # Environment Variables
//!
//! - `FOLIO_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use std::sync::Arc;

use folio_server::clock::SystemClock;
use folio_server::config::{ConfigError, ServerConfig};
use folio_server::services::SessionService;
use folio_server::store::{PgSessionStore, StoreError, create_pool};
use thiserror::Error;

/// Errors that can occur while managing sessions.
#[derive(Debug, Error)]
pub enum SessionsError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Session store error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Delete expired sessions.
pub async fn purge() -> Result<(), SessionsError> {
    let removed = service().await?.purge_expired().await?;
    tracing::info!(removed, "Expired sessions purged");
    Ok(())
}

/// Delete every session.
pub async fn revoke_all() -> Result<(), SessionsError> {
    let removed = service().await?.revoke_all().await?;
    tracing::warn!(removed, "All admin sessions revoked");
    Ok(())
}

async fn service() -> Result<SessionService, SessionsError> {
    let config = ServerConfig::from_env()?;
    let pool = create_pool(config.require_database_url()?).await?;
    let ttl = chrono::Duration::from_std(config.session_ttl)
        .unwrap_or_else(|_| chrono::Duration::hours(1));

    Ok(SessionService::new(
        Arc::new(PgSessionStore::new(pool)),
        Arc::new(SystemClock),
        ttl,
    ))
}
