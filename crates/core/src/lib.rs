//! Folio Core - Shared types library.
//!
//! This crate provides common types used across all Folio components:
//! - `server` - Public site, admin API and the authorization gate
//! - `preview` - Per-tab admin view client and preview data adapter
//! - `cli` - Command-line tools for migrations and credential management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and lets both the server
//! and the client agree on wire formats.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for emails and admin tokens
//! - [`settings`] - Site feature toggles, their defaults and partial updates
//! - [`content`] - Post and project records exposed by the public API
//! - [`handoff`] - The `admin_token` / `admin_view` URL handoff convention

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod content;
pub mod handoff;
pub mod settings;
pub mod types;

pub use content::{ContentError, NewPost, Post, Project};
pub use handoff::{ADMIN_ENTRY_PATH, ADMIN_TOKEN_PARAM, ADMIN_VIEW_PARAM, Handoff};
pub use settings::{
    SettingValue, SettingsAuditEntry, SettingsError, SettingsPatch, SiteSettings,
};
pub use types::*;
