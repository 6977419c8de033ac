//! Error types for the connection lifecycle.

use crate::types::ConnectionState;
use crate::ws_client::WsError;

/// Errors on the connect path.
///
/// Apart from `Configuration` and `AlreadyStarted` these never reach the
/// caller directly: the lifecycle manager absorbs them and turns them into
/// [`LifecycleEvent`](crate::types::LifecycleEvent)s.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The hub endpoint is malformed. Fatal, never retried.
    #[error("invalid hub endpoint: {0}")]
    Configuration(String),

    /// A single connect attempt failed; retried per the initial policy.
    #[error("connect attempt failed: {0}")]
    Transient(#[source] WsError),

    /// The initial-connect policy ran out of attempts.
    #[error("gave up after {attempts} connect attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: WsError,
    },

    /// An established connection dropped. Handled by the transport's
    /// reconnect loop.
    #[error("connection dropped: {0}")]
    MidSessionDrop(String),

    #[error("connection already started (state: {0})")]
    AlreadyStarted(ConnectionState),
}

impl ConnectionError {
    /// Returns `true` if no automatic recovery follows this error.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Exhausted { .. })
    }

    /// Text suitable for a status notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(detail) => format!("Chat server address is invalid: {detail}"),
            Self::Transient(e) if e.is_negotiation() => {
                "Failed to negotiate with the chat server. Retrying...".into()
            }
            Self::Transient(_) => "Connection to the chat server failed. Retrying...".into(),
            Self::Exhausted { last, .. } if last.is_negotiation() => {
                "Failed to negotiate with the chat server. Please refresh the page.".into()
            }
            Self::Exhausted { .. } => {
                "Unable to connect to the chat server. Please refresh the page.".into()
            }
            Self::MidSessionDrop(_) => "Connection lost. Reconnecting...".into(),
            Self::AlreadyStarted(_) => "Already connected to the chat server.".into(),
        }
    }
}

/// Failure of a single send. Never retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("send failed: {0}")]
    Transport(#[source] WsError),

    #[error("hub rejected message ({code}): {message}")]
    Rejected { code: i32, message: String },
}

impl From<WsError> for SendError {
    fn from(err: WsError) -> Self {
        match err {
            WsError::Hub { code, message } => Self::Rejected { code, message },
            other => Self::Transport(other),
        }
    }
}
