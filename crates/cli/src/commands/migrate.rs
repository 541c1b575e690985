//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! folio-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `FOLIO_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! `crates/server/migrations/`, embedded into the binary at build time.

use folio_server::config::{ConfigError, ServerConfig};
use folio_server::store::{create_pool, run_migrations};
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply pending migrations.
pub async fn run() -> Result<(), MigrationError> {
    let config = ServerConfig::from_env()?;
    let database_url = config.require_database_url()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(database_url).await?;

    tracing::info!("Running migrations...");
    run_migrations(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
