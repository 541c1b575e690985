//! Per-tab admin view state machine.
//!
//! ```text
//! Inactive --admin_view on load--> PendingVerification
//! PendingVerification --validate ok--> Active
//! PendingVerification --validate 401--> Inactive
//! Active --logout / exit / LoggedOut signal / 401--> Inactive
//! ```
//!
//! The state only decides what the tab renders. Every privileged read still
//! carries the tab's token and is validated by the server.

use async_trait::async_trait;
use chrono::Utc;
use folio_core::handoff::{ADMIN_ENTRY_PATH, preview_href, take_handoff};
use folio_core::{AdminToken, Handoff};
use tokio::sync::broadcast::{self, error::TryRecvError};
use url::Url;

use crate::channel::{OriginChannel, OriginSignal};
use crate::client::IssuedToken;
use crate::error::ClientError;
use crate::storage::{AdminViewMarker, MemoryTabStorage, TabStorage, TabStorageExt};

/// Session operations a tab needs from the server.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Whether `token` (or the cookie, without one) is a live session.
    async fn validate(&self, token: Option<&AdminToken>) -> Result<bool, ClientError>;

    /// Issue a new per-tab token.
    async fn seed(&self, token: Option<&AdminToken>) -> Result<IssuedToken, ClientError>;

    /// Revoke `token` (or the cookie session).
    async fn logout(&self, token: Option<&AdminToken>) -> Result<(), ClientError>;
}

/// Admin view state of one tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// No preview in this tab.
    Inactive,
    /// Marker set, background validation not yet answered.
    PendingVerification,
    /// Marker set and the last validation succeeded.
    Active,
}

/// One browser tab's admin state.
pub struct AdminTab<S = MemoryTabStorage> {
    storage: S,
    state: ViewState,
    channel: OriginChannel,
    signals: broadcast::Receiver<OriginSignal>,
}

impl AdminTab<MemoryTabStorage> {
    /// A fresh tab with empty storage.
    #[must_use]
    pub fn open(channel: &OriginChannel) -> Self {
        Self::new(MemoryTabStorage::new(), channel)
    }
}

impl<S: TabStorage> AdminTab<S> {
    /// Attach to `storage`, subscribing to `channel`.
    ///
    /// A marker left in storage (a reload) resumes as
    /// [`ViewState::PendingVerification`].
    pub fn new(storage: S, channel: &OriginChannel) -> Self {
        let state = if storage.marker().is_some() {
            ViewState::PendingVerification
        } else {
            ViewState::Inactive
        };
        Self {
            storage,
            state,
            channel: channel.clone(),
            signals: channel.subscribe(),
        }
    }

    /// Current state, after applying pending origin signals.
    pub fn state(&mut self) -> ViewState {
        self.sync();
        self.state
    }

    /// Whether the tab should render the admin preview.
    pub fn is_active(&mut self) -> bool {
        self.state() == ViewState::Active
    }

    /// The tab's own session token.
    #[must_use]
    pub fn token(&self) -> Option<AdminToken> {
        self.storage.token()
    }

    /// The preview marker, if set.
    #[must_use]
    pub fn marker(&self) -> Option<AdminViewMarker> {
        self.storage.marker()
    }

    /// Borrow the underlying storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Consume handoff parameters from the page URL.
    ///
    /// A handed-over token becomes the tab's token; `admin_view` sets the
    /// marker for the current path and starts verification. Both parameters
    /// are removed from `url`.
    pub fn on_page_load(&mut self, url: &mut Url) -> Handoff {
        self.sync();
        let handoff = take_handoff(url);
        let now = Utc::now();

        if let Some(token) = &handoff.token {
            self.storage.store_token(token, now);
            tracing::debug!(token_prefix = token.prefix(), "tab token taken from URL");
        }

        if handoff.admin_view {
            self.storage
                .store_marker(&AdminViewMarker::new(url.path(), now));
            if self.state == ViewState::Inactive {
                self.state = ViewState::PendingVerification;
            }
        }

        handoff
    }

    /// Re-validate the session behind this tab.
    ///
    /// On success the tab becomes active; a tab that authenticated through
    /// the shared cookie gets its own token from the seed endpoint. A 401
    /// clears the tab. Transport errors leave the state untouched; the next
    /// verification settles it.
    ///
    /// # Errors
    ///
    /// Returns error if the server cannot be reached.
    pub async fn verify(&mut self, api: &dyn SessionApi) -> Result<ViewState, ClientError> {
        self.sync();
        if self.storage.marker().is_none() {
            self.state = ViewState::Inactive;
            return Ok(self.state);
        }

        let token = self.storage.token();
        if !api.validate(token.as_ref()).await? {
            tracing::info!("admin view session rejected, leaving preview");
            self.deactivate();
            return Ok(self.state);
        }

        if token.is_none() {
            match api.seed(None).await {
                Ok(issued) => self.adopt_token(&issued.token),
                Err(ClientError::Unauthorized) => {
                    self.deactivate();
                    return Ok(self.state);
                }
                Err(e) => tracing::warn!(error = %e, "per-tab token seed failed, using cookie"),
            }
        }

        self.state = ViewState::Active;
        Ok(self.state)
    }

    /// Log out: revoke the token server-side, clear this tab and tell every
    /// other tab.
    ///
    /// Server errors are logged; the local logout always completes.
    pub async fn logout(&mut self, api: &dyn SessionApi) {
        let token = self.storage.token();
        if let Err(e) = api.logout(token.as_ref()).await {
            tracing::warn!(error = %e, "server logout failed");
        }
        self.deactivate();
        self.channel.publish(OriginSignal::LoggedOut);
    }

    /// Leave the preview. Returns where to navigate.
    pub fn exit_preview(&mut self) -> &'static str {
        self.deactivate();
        ADMIN_ENTRY_PATH
    }

    /// Rewrite a public link so it stays in preview, while active.
    pub fn preview_link(&mut self, href: &str, current_path: &str) -> Option<String> {
        if self.is_active() {
            preview_href(href, current_path)
        } else {
            None
        }
    }

    /// Apply one origin signal.
    pub fn apply(&mut self, signal: OriginSignal) {
        match signal {
            OriginSignal::LoggedOut => self.deactivate(),
        }
    }

    /// Replace the tab's token with a freshly issued one.
    pub(crate) fn adopt_token(&mut self, token: &AdminToken) {
        self.storage.store_token(token, Utc::now());
    }

    /// Clear marker and token.
    pub(crate) fn deactivate(&mut self) {
        self.storage.clear_admin();
        self.state = ViewState::Inactive;
    }

    /// Drain signals published since the last call.
    fn sync(&mut self) {
        loop {
            match self.signals.try_recv() {
                Ok(signal) => self.apply(signal),
                // Only logout is ever sent, so missing some still means logout.
                Err(TryRecvError::Lagged(_)) => self.apply(OriginSignal::LoggedOut),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }
}
