//! Core types for Folio.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod token;

pub use email::{Email, EmailError};
pub use token::{AdminToken, TokenError};
