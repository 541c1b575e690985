//! Site-wide feature toggles.
//!
//! Exactly one settings document exists. Stored values are always merged over
//! [`DEFAULTS`], so a key that was never written still reads as its default.
//! Writes are partial: a [`SettingsPatch`] only touches the keys it carries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key of the maintenance-mode flag.
pub const MAINTENANCE_MODE: &str = "maintenanceMode";
/// Key of the blog visibility flag.
pub const SHOW_BLOG: &str = "showBlog";
/// Key of the projects visibility flag.
pub const SHOW_PROJECTS: &str = "showProjects";

/// Default value of every known toggle.
pub const DEFAULTS: &[(&str, bool)] = &[
    (SHOW_BLOG, true),
    (SHOW_PROJECTS, true),
    ("showStats", true),
    ("showContact", true),
    ("allowComments", true),
    ("showResume", false),
    ("enableSearch", true),
    ("showTestimonials", false),
    (MAINTENANCE_MODE, false),
];

/// Keys that may appear in an update body but are never stored as toggles.
const IGNORED_KEYS: &[&str] = &["adminEmail", "updatedAt", "updatedBy", "_id"];

/// Longest accepted toggle name.
const MAX_KEY_LENGTH: usize = 64;

/// Errors produced while validating a settings update.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// The update body is not a JSON object.
    #[error("settings update must be a JSON object")]
    NotAnObject,
    /// The update contains no storable keys.
    #[error("settings update contains no settings")]
    Empty,
    /// A key is empty or too long.
    #[error("invalid setting name: {0:?}")]
    InvalidKey(String),
    /// A value is neither a boolean nor a string.
    #[error("setting {key} must be a boolean or a string")]
    InvalidValue {
        /// Offending key.
        key: String,
    },
}

/// A single toggle value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// On/off flag.
    Bool(bool),
    /// Free-form value (e.g. a banner message).
    Text(String),
}

impl SettingValue {
    /// Whether the value counts as "on".
    ///
    /// Strings are on when non-empty.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Text(s) => !s.is_empty(),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// The effective site settings: stored values merged over [`DEFAULTS`].
///
/// Serializes as a flat object, e.g.
/// `{"showBlog": true, ..., "updatedAt": "...", "updatedBy": "j***@example.com"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    /// Every toggle, defaults included.
    #[serde(flatten)]
    pub flags: BTreeMap<String, SettingValue>,
    /// Time of the last update, if any was ever made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Masked identity of the last admin who changed the settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            flags: default_flags(),
            updated_at: None,
            updated_by: None,
        }
    }
}

impl SiteSettings {
    /// Merge stored values over the defaults.
    #[must_use]
    pub fn from_stored(
        stored: BTreeMap<String, SettingValue>,
        updated_at: Option<DateTime<Utc>>,
        updated_by: Option<String>,
    ) -> Self {
        let mut flags = default_flags();
        flags.extend(stored);
        Self {
            flags,
            updated_at,
            updated_by,
        }
    }

    /// Value of a toggle, if known.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.flags.get(key)
    }

    /// Whether a toggle is on. Unknown keys are off.
    #[must_use]
    pub fn is_enabled(&self, key: &str) -> bool {
        self.flags.get(key).is_some_and(SettingValue::is_truthy)
    }

    /// Whether the site-wide maintenance lockout is active.
    #[must_use]
    pub fn maintenance_mode(&self) -> bool {
        self.is_enabled(MAINTENANCE_MODE)
    }

    /// Apply a patch in place, leaving untouched keys as they are.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        for (key, value) in patch.iter() {
            self.flags.insert(key.to_owned(), value.clone());
        }
    }
}

fn default_flags() -> BTreeMap<String, SettingValue> {
    DEFAULTS
        .iter()
        .map(|(key, value)| ((*key).to_owned(), SettingValue::Bool(*value)))
        .collect()
}

/// A validated partial settings update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SettingsPatch(BTreeMap<String, SettingValue>);

impl SettingsPatch {
    /// Start an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key to the patch.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Validate an update body.
    ///
    /// Bookkeeping keys (`adminEmail`, `updatedAt`, `updatedBy`, `_id`) are
    /// dropped silently.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not an object, if a value is not a
    /// boolean or string, if a key is empty or too long, or if nothing
    /// storable remains.
    pub fn from_json(body: &serde_json::Value) -> Result<Self, SettingsError> {
        let object = body.as_object().ok_or(SettingsError::NotAnObject)?;
        let mut values = BTreeMap::new();

        for (key, value) in object {
            if IGNORED_KEYS.contains(&key.as_str()) {
                continue;
            }
            if key.is_empty() || key.len() > MAX_KEY_LENGTH {
                return Err(SettingsError::InvalidKey(key.clone()));
            }
            let value = match value {
                serde_json::Value::Bool(b) => SettingValue::Bool(*b),
                serde_json::Value::String(s) => SettingValue::Text(s.clone()),
                _ => return Err(SettingsError::InvalidValue { key: key.clone() }),
            };
            values.insert(key.clone(), value);
        }

        if values.is_empty() {
            return Err(SettingsError::Empty);
        }
        Ok(Self(values))
    }

    /// Whether the patch carries no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keys touched by the patch, in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Iterate over the patched keys and values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The patch as a JSON object, for storage.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.0
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    SettingValue::Bool(b) => serde_json::Value::Bool(*b),
                    SettingValue::Text(s) => serde_json::Value::String(s.clone()),
                };
                (k.clone(), value)
            })
            .collect::<serde_json::Map<_, _>>()
            .into()
    }
}

/// One entry of the append-only settings change log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsAuditEntry {
    /// Keys changed by the update.
    pub changed_keys: Vec<String>,
    /// Masked identity of the admin who made the change.
    pub changed_by: String,
    /// When the change happened.
    pub changed_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_defaults_are_complete() {
        let settings = SiteSettings::default();
        assert_eq!(settings.flags.len(), DEFAULTS.len());
        assert!(settings.is_enabled(SHOW_BLOG));
        assert!(!settings.is_enabled("showResume"));
        assert!(!settings.maintenance_mode());
    }

    #[test]
    fn test_stored_values_override_defaults() {
        let stored = BTreeMap::from([
            (MAINTENANCE_MODE.to_owned(), SettingValue::Bool(true)),
            ("banner".to_owned(), SettingValue::from("Back soon")),
        ]);
        let settings = SiteSettings::from_stored(stored, None, None);
        assert!(settings.maintenance_mode());
        assert!(settings.is_enabled(SHOW_PROJECTS));
        assert_eq!(
            settings.get("banner"),
            Some(&SettingValue::Text("Back soon".to_owned()))
        );
    }

    #[test]
    fn test_apply_is_partial() {
        let mut settings = SiteSettings::default();
        settings.apply(&SettingsPatch::new().set("showStats", false));
        settings.apply(&SettingsPatch::new().set(SHOW_BLOG, false));

        assert!(!settings.is_enabled("showStats"));
        assert!(!settings.is_enabled(SHOW_BLOG));
        assert!(settings.is_enabled(SHOW_PROJECTS));
        assert!(settings.is_enabled("enableSearch"));
    }

    #[test]
    fn test_patch_from_json_accepts_bools_and_strings() {
        let patch =
            SettingsPatch::from_json(&json!({"showBlog": false, "banner": "hi", "adminEmail": "x"}))
                .unwrap();
        assert_eq!(patch.keys(), vec!["banner".to_owned(), "showBlog".to_owned()]);
    }

    #[test]
    fn test_patch_from_json_rejects_other_values() {
        assert_eq!(
            SettingsPatch::from_json(&json!({"showBlog": 1})),
            Err(SettingsError::InvalidValue {
                key: "showBlog".to_owned()
            })
        );
        assert_eq!(
            SettingsPatch::from_json(&json!({"showBlog": null})),
            Err(SettingsError::InvalidValue {
                key: "showBlog".to_owned()
            })
        );
        assert_eq!(
            SettingsPatch::from_json(&json!([true])),
            Err(SettingsError::NotAnObject)
        );
        assert_eq!(
            SettingsPatch::from_json(&json!({"adminEmail": "a@b.c"})),
            Err(SettingsError::Empty)
        );
        assert!(matches!(
            SettingsPatch::from_json(&json!({"": true})),
            Err(SettingsError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_settings_serialize_flat() {
        let settings = SiteSettings::default();
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["showBlog"], json!(true));
        assert_eq!(value["maintenanceMode"], json!(false));
        assert!(value.get("updatedAt").is_none());
        assert!(value.get("flags").is_none());
    }

    #[test]
    fn test_settings_deserialize_flat() {
        let settings: SiteSettings = serde_json::from_value(json!({
            "showBlog": false,
            "maintenanceMode": true,
            "updatedBy": "j***@example.com"
        }))
        .unwrap();
        assert!(settings.maintenance_mode());
        assert!(!settings.is_enabled(SHOW_BLOG));
        assert_eq!(settings.updated_by.as_deref(), Some("j***@example.com"));
    }

    #[test]
    fn test_patch_to_json() {
        let patch = SettingsPatch::new().set(MAINTENANCE_MODE, true).set("banner", "x");
        assert_eq!(patch.to_json(), json!({"maintenanceMode": true, "banner": "x"}));
    }
}
