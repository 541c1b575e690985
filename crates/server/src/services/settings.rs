//! Site settings service: `get()` and `update(partial)`.
//!
//! Passed explicitly to the request gate and handlers; there is no global
//! settings state.

use std::sync::Arc;

use folio_core::{Email, SettingsAuditEntry, SettingsPatch, SiteSettings};
use tracing::instrument;

use crate::clock::Clock;
use crate::store::{SettingsStore, StoreError};

/// Reads and partially updates the singleton settings document.
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
}

impl SettingsService {
    /// Most audit entries returned by [`SettingsService::audit_log`].
    pub const AUDIT_LIMIT: u32 = 50;

    #[must_use]
    pub fn new(store: Arc<dyn SettingsStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Effective settings: stored values over defaults.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read.
    pub async fn get(&self) -> Result<SiteSettings, StoreError> {
        let settings = match self.store.load().await? {
            Some(stored) => {
                SiteSettings::from_stored(stored.flags, stored.updated_at, stored.updated_by)
            }
            None => SiteSettings::default(),
        };
        Ok(settings)
    }

    /// Effective settings for rendering, falling back to the defaults when
    /// the store cannot be read.
    pub async fn get_or_default(&self) -> SiteSettings {
        self.get().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "settings read failed, rendering with defaults");
            SiteSettings::default()
        })
    }

    /// Merge `patch` into the stored settings and record who changed what.
    ///
    /// Keys not in the patch keep their stored (or default) value. The audit
    /// entry carries the masked identity, never the raw email.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be written.
    #[instrument(skip(self, patch, admin), fields(keys = ?patch.keys()))]
    pub async fn update(
        &self,
        patch: &SettingsPatch,
        admin: &Email,
    ) -> Result<SiteSettings, StoreError> {
        let audit = SettingsAuditEntry {
            changed_keys: patch.keys(),
            changed_by: admin.masked(),
            changed_at: self.clock.now(),
        };

        let stored = self.store.apply(patch, &audit).await?;
        tracing::info!(changed_by = %audit.changed_by, "site settings updated");

        Ok(SiteSettings::from_stored(
            stored.flags,
            stored.updated_at,
            stored.updated_by,
        ))
    }

    /// Whether maintenance mode is on.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read. The request gate
    /// treats that as "off".
    pub async fn maintenance_mode(&self) -> Result<bool, StoreError> {
        Ok(self.get().await?.maintenance_mode())
    }

    /// Recent settings changes, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read.
    pub async fn audit_log(&self) -> Result<Vec<SettingsAuditEntry>, StoreError> {
        self.store.recent_audit(Self::AUDIT_LIMIT).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use async_trait::async_trait;
    use folio_core::SettingValue;

    use super::*;
    use crate::clock::ManualClock;
    use crate::store::{MemorySettingsStore, StoredSettings};

    /// A settings store whose every call fails.
    pub(crate) struct FailingSettingsStore;

    #[async_trait]
    impl SettingsStore for FailingSettingsStore {
        async fn load(&self) -> Result<Option<StoredSettings>, StoreError> {
            Err(StoreError::Unavailable("settings store down".to_owned()))
        }
        async fn apply(
            &self,
            _: &SettingsPatch,
            _: &SettingsAuditEntry,
        ) -> Result<StoredSettings, StoreError> {
            Err(StoreError::Unavailable("settings store down".to_owned()))
        }
        async fn recent_audit(&self, _: u32) -> Result<Vec<SettingsAuditEntry>, StoreError> {
            Err(StoreError::Unavailable("settings store down".to_owned()))
        }
    }

    fn service() -> SettingsService {
        SettingsService::new(
            Arc::new(MemorySettingsStore::new()),
            Arc::new(ManualClock::default()),
        )
    }

    fn admin() -> Email {
        Email::parse("jane@example.com").unwrap()
    }

    #[tokio::test]
    async fn test_get_before_any_write_returns_defaults() {
        let settings = service().get().await.unwrap();
        assert_eq!(settings, SiteSettings::default());
    }

    #[tokio::test]
    async fn test_update_is_partial() {
        let service = service();
        service
            .update(&SettingsPatch::new().set("showStats", false), &admin())
            .await
            .unwrap();
        let settings = service
            .update(&SettingsPatch::new().set("showBlog", false), &admin())
            .await
            .unwrap();

        assert!(!settings.is_enabled("showBlog"));
        assert!(!settings.is_enabled("showStats"));
        assert!(settings.is_enabled("showProjects"));
        assert_eq!(settings.get("showResume"), Some(&SettingValue::Bool(false)));
        assert_eq!(service.get().await.unwrap(), settings);
    }

    #[tokio::test]
    async fn test_update_stamps_masked_identity() {
        let service = service();
        let settings = service
            .update(&SettingsPatch::new().set("maintenanceMode", true), &admin())
            .await
            .unwrap();

        assert!(settings.updated_at.is_some());
        assert_eq!(settings.updated_by.as_deref(), Some("j***@example.com"));
        assert!(service.maintenance_mode().await.unwrap());

        let log = service.audit_log().await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].changed_keys, vec!["maintenanceMode".to_owned()]);
        assert!(!log[0].changed_by.contains("jane"));
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_error() {
        let service = SettingsService::new(
            Arc::new(FailingSettingsStore),
            Arc::new(ManualClock::default()),
        );
        assert!(service.maintenance_mode().await.is_err());
        assert_eq!(service.get_or_default().await, SiteSettings::default());
    }
}
