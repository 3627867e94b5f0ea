//! Session lifecycle events.
//!
//! The API client publishes here when the server rejects the session; the
//! component that owns the session subscribes and reacts (sign-out, prompt).

use tokio::sync::broadcast;

const SESSION_EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The server answered `401 Unauthorized`.
    Expired,
}

/// Cloneable emitter for [`SessionEvent`]s.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEvents {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publish [`SessionEvent::Expired`]. Having no subscribers is fine.
    pub fn expired(&self) {
        tracing::warn!("Session expired; notifying subscribers");
        let _ = self.sender.send(SessionEvent::Expired);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "current_thread")]
    async fn subscribers_receive_expiry() {
        let events = SessionEvents::new();
        let mut first = events.subscribe();
        let mut second = events.clone().subscribe();

        events.expired();

        assert_eq!(first.recv().await.unwrap(), SessionEvent::Expired);
        assert_eq!(second.recv().await.unwrap(), SessionEvent::Expired);
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        SessionEvents::new().expired();
    }
}
