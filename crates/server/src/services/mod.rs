//! Business logic for the admin session mechanism.
//!
//! - [`sessions`] - Session Store operations (create, validate, revoke)
//! - [`auth`] - Credential check against the configured administrator
//! - [`settings`] - Site settings `get()` / `update(partial)`

pub mod auth;
pub mod sessions;
pub mod settings;

pub use auth::{AuthError, AuthService};
pub use sessions::{IssuedSession, SessionService};
pub use settings::SettingsService;
