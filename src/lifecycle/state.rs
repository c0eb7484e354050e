//! Server lifecycle state machine.
//!
//! # States
//! ```text
//! Created → Running → ShuttingDown → Stopped
//! ```
//!
//! `Running` may also go straight to `Stopped` when the accept loop fails
//! on its own. Observers follow transitions through a watch channel.

use std::fmt;

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Constructed, not yet serving.
    Created,
    /// Accepting connections.
    Running,
    /// Termination requested; draining in-flight requests.
    ShuttingDown,
    /// Listener released.
    Stopped,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerState::Created => "created",
            ServerState::Running => "running",
            ServerState::ShuttingDown => "shutting_down",
            ServerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Current lifecycle state plus its subscribers.
#[derive(Debug)]
pub struct Lifecycle {
    tx: watch::Sender<ServerState>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ServerState::Created);
        Self { tx }
    }

    pub fn current(&self) -> ServerState {
        *self.tx.borrow()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.tx.subscribe()
    }

    /// Move to `next`, notifying subscribers.
    pub fn transition(&self, next: ServerState) {
        let previous = self.tx.send_replace(next);
        tracing::debug!(from = %previous, to = %next, "Server state changed");
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_created() {
        assert_eq!(Lifecycle::new().current(), ServerState::Created);
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let lifecycle = Lifecycle::new();
        let mut rx = lifecycle.subscribe();

        lifecycle.transition(ServerState::Running);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ServerState::Running);

        lifecycle.transition(ServerState::ShuttingDown);
        lifecycle.transition(ServerState::Stopped);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ServerState::Stopped);
    }

    #[test]
    fn transition_without_subscribers_is_kept() {
        let lifecycle = Lifecycle::new();
        lifecycle.transition(ServerState::Running);
        assert_eq!(lifecycle.current(), ServerState::Running);
    }
}
