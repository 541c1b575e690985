//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::clock::{Clock, SystemClock};
use crate::config::ServerConfig;
use crate::services::{AuthService, SessionService, SettingsService};
use crate::store::{
    ContentStore, MemoryContentStore, MemorySessionStore, MemorySettingsStore, PgContentStore,
    PgSessionStore, PgSettingsStore, SessionStore, SettingsStore,
};

/// The three backing stores.
#[derive(Clone)]
pub struct Stores {
    pub sessions: Arc<dyn SessionStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub content: Arc<dyn ContentStore>,
}

impl Stores {
    /// Process-local stores; nothing survives a restart.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            sessions: Arc::new(MemorySessionStore::new()),
            settings: Arc::new(MemorySettingsStore::new()),
            content: Arc::new(MemoryContentStore::new()),
        }
    }

    /// Stores backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            sessions: Arc::new(PgSessionStore::new(pool.clone())),
            settings: Arc::new(PgSettingsStore::new(pool.clone())),
            content: Arc::new(PgContentStore::new(pool.clone())),
        }
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the services and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    sessions: SessionService,
    settings: SettingsService,
    auth: AuthService,
    content: Arc<dyn ContentStore>,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create application state over `stores` with the system clock.
    #[must_use]
    pub fn new(config: ServerConfig, stores: Stores) -> Self {
        Self::with_clock(config, stores, Arc::new(SystemClock))
    }

    /// Create application state with an explicit clock.
    #[must_use]
    pub fn with_clock(config: ServerConfig, stores: Stores, clock: Arc<dyn Clock>) -> Self {
        // The config caps the TTL at 30 days, well inside chrono's range.
        let ttl = chrono::Duration::from_std(config.session_ttl)
            .unwrap_or_else(|_| chrono::Duration::hours(1));

        Self {
            inner: Arc::new(AppStateInner {
                sessions: SessionService::new(stores.sessions, clock.clone(), ttl),
                settings: SettingsService::new(stores.settings, clock.clone()),
                auth: AuthService::new(config.admin.clone()),
                content: stores.content,
                clock,
                config,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get the Session Store service.
    #[must_use]
    pub fn sessions(&self) -> &SessionService {
        &self.inner.sessions
    }

    /// Get the settings service.
    #[must_use]
    pub fn settings(&self) -> &SettingsService {
        &self.inner.settings
    }

    /// Get the credential check.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get the content store.
    #[must_use]
    pub fn content(&self) -> &dyn ContentStore {
        self.inner.content.as_ref()
    }

    /// Get the clock.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }
}
