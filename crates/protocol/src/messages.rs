use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ChatId, MessageId, UserId};

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

/// First frame sent by the client after the socket opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeRequest {
    pub protocol_version: u32,
    pub client_name: String,
    pub client_version: String,
}

/// Hub answer accepting the handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeAck {
    pub protocol_version: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub connection_id: String,
}

// ---------------------------------------------------------------------------
// Invocations
// ---------------------------------------------------------------------------

/// Payload of the `SendMessage` hub method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub content: String,
    pub chat_id: ChatId,
    pub sender_id: UserId,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A chat message as delivered by the `ReceiveMessage` hub event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub content: String,
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub timestamp: DateTime<Utc>,
}
