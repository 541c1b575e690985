//! Folio server library.
//!
//! The public portfolio site, its JSON API and the admin session mechanism:
//! the Session Store, the credential check and the authorization gate with
//! maintenance mode. Exposed as a library so the binary, the CLI and the
//! integration tests share one router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod tasks;

pub use app::build_router;
pub use state::{AppState, Stores};
