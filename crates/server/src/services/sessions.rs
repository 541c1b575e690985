//! Admin session issuance, validation and revocation.
//!
//! The service is the only writer of session records. Validation fails
//! closed: a store error reads as "not valid".

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use folio_core::AdminToken;
use serde::Serialize;
use tracing::instrument;

use crate::clock::Clock;
use crate::store::{AdminSession, SessionStore, StoreError};

/// A freshly issued session, as returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedSession {
    #[serde(rename = "admin_token")]
    pub token: AdminToken,
    pub expires_at: DateTime<Utc>,
}

/// Issues, validates and revokes admin sessions.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SessionService {
    /// Create a service issuing sessions that live for `ttl`.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    /// Session lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a new session for `admin_identity`.
    ///
    /// Any number of sessions may coexist for the same identity, one per tab.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the session cannot be persisted.
    #[instrument(skip(self, admin_identity))]
    pub async fn create(&self, admin_identity: &str) -> Result<IssuedSession, StoreError> {
        let now = self.clock.now();
        let session = AdminSession {
            token: AdminToken::from_entropy(rand::random()),
            admin_identity: admin_identity.to_owned(),
            created_at: now,
            expires_at: now + self.ttl,
        };

        self.store.insert(&session).await?;
        tracing::info!(
            token_prefix = session.token.prefix(),
            expires_at = %session.expires_at,
            "admin session created"
        );

        Ok(IssuedSession {
            token: session.token,
            expires_at: session.expires_at,
        })
    }

    /// Find the live session behind `token`.
    ///
    /// An expired record is deleted on the way out and reported as absent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read. Callers making an
    /// authorization decision should use [`SessionService::is_valid`], which
    /// treats that as invalid.
    pub async fn lookup(&self, token: &AdminToken) -> Result<Option<AdminSession>, StoreError> {
        let Some(session) = self.store.find(token).await? else {
            return Ok(None);
        };

        if session.is_expired_at(self.clock.now()) {
            // A concurrent request may have deleted it already; that is fine.
            self.store.delete(token).await?;
            tracing::debug!(token_prefix = token.prefix(), "expired admin session removed");
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// The live session behind `token`, for an authorization decision.
    ///
    /// Fails closed: any store error yields `None`.
    pub async fn authorize(&self, token: &AdminToken) -> Option<AdminSession> {
        match self.lookup(token).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    token_prefix = token.prefix(),
                    "session lookup failed, treating token as invalid"
                );
                None
            }
        }
    }

    /// Whether `token` names a live session. Fails closed like
    /// [`SessionService::authorize`].
    pub async fn is_valid(&self, token: &AdminToken) -> bool {
        self.authorize(token).await.is_some()
    }

    /// Delete the session behind `token`. Unknown tokens are not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be written.
    pub async fn revoke(&self, token: &AdminToken) -> Result<(), StoreError> {
        if self.store.delete(token).await? {
            tracing::info!(token_prefix = token.prefix(), "admin session revoked");
        }
        Ok(())
    }

    /// Delete every expired session. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be written.
    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        self.store.delete_expired(self.clock.now()).await
    }

    /// Delete every session, signing the admin out everywhere.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be written.
    pub async fn revoke_all(&self) -> Result<u64, StoreError> {
        let removed = self.store.delete_all().await?;
        tracing::warn!(removed, "all admin sessions revoked");
        Ok(removed)
    }

    /// Check the session store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if it is not.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemorySessionStore;

    /// A session store whose every call fails.
    pub(crate) struct FailingSessionStore;

    #[async_trait]
    impl SessionStore for FailingSessionStore {
        async fn insert(&self, _: &AdminSession) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("session store down".to_owned()))
        }
        async fn find(&self, _: &AdminToken) -> Result<Option<AdminSession>, StoreError> {
            Err(StoreError::Unavailable("session store down".to_owned()))
        }
        async fn delete(&self, _: &AdminToken) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("session store down".to_owned()))
        }
        async fn delete_expired(&self, _: DateTime<Utc>) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("session store down".to_owned()))
        }
        async fn delete_all(&self) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("session store down".to_owned()))
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("session store down".to_owned()))
        }
    }

    fn service() -> (SessionService, Arc<ManualClock>, Arc<MemorySessionStore>) {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(MemorySessionStore::new());
        let service = SessionService::new(store.clone(), clock.clone(), Duration::hours(1));
        (service, clock, store)
    }

    #[tokio::test]
    async fn test_created_session_is_valid() {
        let (service, _, _) = service();
        let issued = service.create("admin@example.com").await.unwrap();

        assert!(service.is_valid(&issued.token).await);
        assert_eq!(issued.token.as_str().len(), AdminToken::ENTROPY_BYTES * 2);
        let session = service.lookup(&issued.token).await.unwrap().unwrap();
        assert_eq!(session.admin_identity, "admin@example.com");
    }

    #[tokio::test]
    async fn test_expired_session_is_invalid_and_deleted() {
        let (service, clock, store) = service();
        let issued = service.create("admin@example.com").await.unwrap();

        clock.advance(Duration::hours(1));
        assert!(service.is_valid(&issued.token).await, "valid at expiry");

        clock.advance(Duration::seconds(1));
        assert!(!service.is_valid(&issued.token).await);
        assert!(store.find(&issued.token).await.unwrap().is_none());
        assert!(!service.is_valid(&issued.token).await);
    }

    #[tokio::test]
    async fn test_unknown_token_is_invalid() {
        let (service, _, _) = service();
        service.create("admin@example.com").await.unwrap();

        let forged = AdminToken::from_entropy([0u8; AdminToken::ENTROPY_BYTES]);
        assert!(!service.is_valid(&forged).await);
    }

    #[tokio::test]
    async fn test_sessions_for_same_identity_are_independent() {
        let (service, _, _) = service();
        let a = service.create("admin@example.com").await.unwrap();
        let b = service.create("admin@example.com").await.unwrap();

        assert_ne!(a.token, b.token);
        service.revoke(&a.token).await.unwrap();
        assert!(!service.is_valid(&a.token).await);
        assert!(service.is_valid(&b.token).await);
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (service, _, _) = service();
        let issued = service.create("admin@example.com").await.unwrap();

        service.revoke(&issued.token).await.unwrap();
        service.revoke(&issued.token).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_failure_fails_closed() {
        let service = SessionService::new(
            Arc::new(FailingSessionStore),
            Arc::new(ManualClock::default()),
            Duration::hours(1),
        );
        let token = AdminToken::parse("anything").unwrap();

        assert!(!service.is_valid(&token).await);
        assert!(service.authorize(&token).await.is_none());
        assert!(service.lookup(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_purge_expired_and_revoke_all() {
        let (service, clock, store) = service();
        service.create("admin@example.com").await.unwrap();
        clock.advance(Duration::hours(2));
        let live = service.create("admin@example.com").await.unwrap();

        assert_eq!(service.purge_expired().await.unwrap(), 1);
        assert!(service.is_valid(&live.token).await);
        assert_eq!(service.revoke_all().await.unwrap(), 1);
        assert!(store.is_empty().await);
    }
}
