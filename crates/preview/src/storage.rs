//! Tab-local storage.
//!
//! Each browser tab keeps its own admin token and preview marker. Nothing in
//! here is shared between tabs; cross-tab signals go through
//! [`crate::OriginChannel`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use folio_core::AdminToken;
use serde::{Deserialize, Serialize};

/// Key holding the tab's own session token.
pub const TOKEN_KEY: &str = "admin_token";

/// Key holding the time (epoch millis) the tab received its token.
pub const LOGIN_TS_KEY: &str = "admin_login_ts";

/// Key holding the serialized [`AdminViewMarker`].
pub const VIEW_KEY: &str = "admin_view";

/// String key/value storage scoped to one tab.
pub trait TabStorage: Send {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one.
    fn set(&mut self, key: &str, value: String);

    /// Remove a value. Removing an absent key is a no-op.
    fn remove(&mut self, key: &str);
}

/// In-process [`TabStorage`].
#[derive(Debug, Clone, Default)]
pub struct MemoryTabStorage {
    entries: HashMap<String, String>,
}

impl MemoryTabStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TabStorage for MemoryTabStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_owned(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Records that this tab is in admin preview, and where it was turned on.
///
/// The marker only selects which components render. It never authorizes a
/// read by itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminViewMarker {
    /// Path the preview was activated on.
    pub path: String,
    /// Activation time, epoch millis.
    pub ts: i64,
}

impl AdminViewMarker {
    /// Marker for `path` stamped with `now`.
    #[must_use]
    pub fn new(path: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            ts: now.timestamp_millis(),
        }
    }
}

/// Typed accessors over a [`TabStorage`].
pub(crate) trait TabStorageExt: TabStorage {
    fn token(&self) -> Option<AdminToken> {
        self.get(TOKEN_KEY)
            .and_then(|raw| AdminToken::parse(&raw).ok())
    }

    fn store_token(&mut self, token: &AdminToken, now: DateTime<Utc>) {
        self.set(TOKEN_KEY, token.as_str().to_owned());
        self.set(LOGIN_TS_KEY, now.timestamp_millis().to_string());
    }

    fn marker(&self) -> Option<AdminViewMarker> {
        self.get(VIEW_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
    }

    fn store_marker(&mut self, marker: &AdminViewMarker) {
        if let Ok(raw) = serde_json::to_string(marker) {
            self.set(VIEW_KEY, raw);
        }
    }

    fn clear_admin(&mut self) {
        self.remove(TOKEN_KEY);
        self.remove(LOGIN_TS_KEY);
        self.remove(VIEW_KEY);
    }
}

impl<S: TabStorage + ?Sized> TabStorageExt for S {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_round_trips_through_storage() {
        let mut storage = MemoryTabStorage::new();
        let marker = AdminViewMarker::new("/blog", Utc::now());

        storage.store_marker(&marker);
        assert_eq!(storage.marker(), Some(marker));
        assert!(storage.get(VIEW_KEY).unwrap().contains("\"path\":\"/blog\""));
    }

    #[test]
    fn test_corrupt_values_read_as_absent() {
        let mut storage = MemoryTabStorage::new();
        storage.set(VIEW_KEY, "not json".to_string());
        storage.set(TOKEN_KEY, "has space".to_string());

        assert!(storage.marker().is_none());
        assert!(storage.token().is_none());
    }

    #[test]
    fn test_clear_admin_removes_every_key() {
        let mut storage = MemoryTabStorage::new();
        storage.store_token(&AdminToken::parse("abc123").unwrap(), Utc::now());
        storage.store_marker(&AdminViewMarker::new("/", Utc::now()));
        storage.set("unrelated", "kept".to_string());

        storage.clear_admin();

        for key in [TOKEN_KEY, LOGIN_TS_KEY, VIEW_KEY] {
            assert!(storage.get(key).is_none(), "{key}");
        }
        assert_eq!(storage.get("unrelated").as_deref(), Some("kept"));
    }
}
