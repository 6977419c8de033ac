use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Current wire protocol version spoken by this client.
pub const PROTOCOL_VERSION: u32 = 2;

/// Oldest hub protocol version that is still accepted (with a warning).
pub const MIN_PROTOCOL_VERSION: u32 = 1;

/// How often the client sends keepalive pings.
pub const WS_PING_PERIOD: Duration = Duration::from_secs(15);

/// Read deadline: if *nothing* arrives from the hub within this window
/// (no pong, no completion, no push event) the connection is considered
/// dropped. Must be comfortably larger than the hub's own keepalive period.
pub const WS_SERVER_TIMEOUT: Duration = Duration::from_secs(30);

/// Time allowed to write a single frame to the socket.
pub const WS_WRITE_WAIT: Duration = Duration::from_secs(10);

/// Time allowed for the hub to answer the handshake.
pub const WS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for a single invocation waiting on its completion.
pub const WS_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum inbound frame size in bytes (1 MB).
pub const WS_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Hub method invoked to post a chat message.
pub const SEND_MESSAGE_METHOD: &str = "SendMessage";

/// Hub event carrying a chat message to subscribers.
pub const RECEIVE_MESSAGE_EVENT: &str = "ReceiveMessage";

/// WebSocket message type identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    // Connection management
    #[serde(rename = "handshake")]
    Handshake,
    #[serde(rename = "handshake_ack")]
    HandshakeAck,
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "pong")]
    Pong,

    // Invocations from client to hub
    #[serde(rename = "send_message")]
    SendMessage,

    // Responses from hub to client
    #[serde(rename = "completion")]
    Completion,
    #[serde(rename = "error")]
    Error,

    // Events from hub to client (push notifications)
    #[serde(rename = "receive_message")]
    ReceiveMessage,

    /// Forward compatibility: unknown message types deserialize here.
    #[serde(other)]
    Unknown,
}

impl MessageType {
    /// Hub-facing method or event name, if this type maps to one.
    pub fn hub_name(&self) -> Option<&'static str> {
        match self {
            MessageType::SendMessage => Some(SEND_MESSAGE_METHOD),
            MessageType::ReceiveMessage => Some(RECEIVE_MESSAGE_EVENT),
            _ => None,
        }
    }
}

/// Common hub error codes.
pub const WS_ERR_CODE_BAD_REQUEST: i32 = 400;
pub const WS_ERR_CODE_UNAUTHORIZED: i32 = 401;
pub const WS_ERR_CODE_NOT_FOUND: i32 = 404;
pub const WS_ERR_CODE_NOT_ACCEPTED: i32 = 406;
pub const WS_ERR_CODE_INTERNAL: i32 = 500;

/// Result of comparing a hub's protocol version against ours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolCompatibility {
    Compatible,
    /// Still works, but the hub should be upgraded.
    Deprecated { peer_version: u32 },
    /// Cannot talk to this hub.
    Incompatible { peer_version: u32, reason: String },
}

/// Checks whether a hub speaking `peer_version` can be used.
pub fn check_protocol_compatibility(peer_version: u32) -> ProtocolCompatibility {
    if peer_version == PROTOCOL_VERSION {
        ProtocolCompatibility::Compatible
    } else if peer_version > PROTOCOL_VERSION {
        ProtocolCompatibility::Incompatible {
            peer_version,
            reason: format!(
                "hub protocol v{peer_version} is newer than client v{PROTOCOL_VERSION}"
            ),
        }
    } else if peer_version >= MIN_PROTOCOL_VERSION {
        ProtocolCompatibility::Deprecated { peer_version }
    } else {
        ProtocolCompatibility::Incompatible {
            peer_version,
            reason: format!(
                "hub protocol v{peer_version} is older than minimum v{MIN_PROTOCOL_VERSION}"
            ),
        }
    }
}
