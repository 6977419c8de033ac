//! Public types for the connection lifecycle manager.

use std::fmt;

/// Lifecycle state of the hub connection.
///
/// `Disconnected` and `Failed` are terminal: nothing leaves them
/// automatically, only `stop()` (or `restart()`) does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Not started, or stopped.
    Idle,
    /// Initial handshake in progress (including backoff between attempts).
    Connecting,
    /// Connected and subscribed to inbound messages.
    Connected,
    /// Connection dropped mid-session, transport is retrying.
    Reconnecting,
    /// Mid-session retries ran out.
    Disconnected,
    /// Initial-connect retries ran out.
    Failed,
}

impl ConnectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Disconnected => "disconnected",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Status events emitted by the lifecycle manager.
///
/// These are meant for presentation only and never expose the
/// underlying connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The initial connection was established.
    Connected,
    /// The connection dropped and the transport is retrying.
    Reconnecting,
    /// A mid-session reconnect succeeded.
    Reconnected,
    /// Mid-session retries are exhausted; the connection is closed.
    Closed,
    /// An initial-connect attempt failed. `terminal` is set once retries
    /// are exhausted and manual action is required.
    ConnectionError { message: String, terminal: bool },
}

impl LifecycleEvent {
    /// Returns `true` for events that require manual intervention.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Closed => true,
            Self::ConnectionError { terminal, .. } => *terminal,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(ConnectionState::Failed.is_terminal());
        assert!(ConnectionState::Disconnected.is_terminal());
        assert!(!ConnectionState::Reconnecting.is_terminal());
        assert!(!ConnectionState::Idle.is_terminal());
    }

    #[test]
    fn terminal_events() {
        assert!(LifecycleEvent::Closed.is_terminal());
        assert!(
            LifecycleEvent::ConnectionError {
                message: "gone".into(),
                terminal: true,
            }
            .is_terminal()
        );
        assert!(
            !LifecycleEvent::ConnectionError {
                message: "retrying".into(),
                terminal: false,
            }
            .is_terminal()
        );
        assert!(!LifecycleEvent::Reconnected.is_terminal());
    }

    #[test]
    fn state_display() {
        assert_eq!(ConnectionState::Reconnecting.to_string(), "reconnecting");
    }
}
