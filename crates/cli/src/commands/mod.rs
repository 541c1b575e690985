//! CLI command implementations.

pub mod migrate;
pub mod password;
pub mod sessions;
