//! Same-origin broadcast between tabs.

use tokio::sync::broadcast;

/// Signals shared by every tab of one origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginSignal {
    /// Some tab logged out; every tab must drop its admin state.
    LoggedOut,
}

/// Publish/subscribe channel standing in for the browser's origin-wide
/// storage events.
///
/// Cloning yields another handle to the same channel.
#[derive(Debug, Clone)]
pub struct OriginChannel {
    sender: broadcast::Sender<OriginSignal>,
}

impl OriginChannel {
    const CAPACITY: usize = 16;

    /// Create a new channel with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(Self::CAPACITY);
        Self { sender }
    }

    /// Subscribe to signals published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OriginSignal> {
        self.sender.subscribe()
    }

    /// Publish `signal` to every subscriber, the publisher included.
    pub fn publish(&self, signal: OriginSignal) {
        let receivers = self.sender.send(signal).unwrap_or(0);
        tracing::debug!(?signal, receivers, "origin signal published");
    }
}

impl Default for OriginChannel {
    fn default() -> Self {
        Self::new()
    }
}
