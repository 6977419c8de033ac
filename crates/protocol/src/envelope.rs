use serde::{Deserialize, Serialize};

use crate::constants::MessageType;

/// Error details carried by a hub frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsError {
    pub code: i32,
    pub message: String,
}

/// Envelope for every WebSocket frame exchanged with the hub.
///
/// `payload` is kept as a `RawValue` so the receiver can pick the concrete
/// type after looking at `msg_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub id: String,
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Box<serde_json::value::RawValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WsError>,
}

impl Envelope {
    /// Creates a new envelope with the given type and payload.
    pub fn new<T: Serialize>(
        id: impl Into<String>,
        msg_type: MessageType,
        payload: Option<&T>,
    ) -> Result<Self, serde_json::Error> {
        let raw = match payload {
            Some(p) => Some(serde_json::value::to_raw_value(p)?),
            None => None,
        };
        Ok(Self {
            id: id.into(),
            msg_type,
            payload: raw,
            error: None,
        })
    }

    /// Deserializes the payload into the given type.
    pub fn parse_payload<T: for<'de> Deserialize<'de>>(
        &self,
    ) -> Result<Option<T>, serde_json::Error> {
        match &self.payload {
            Some(raw) => Ok(Some(serde_json::from_str(raw.get())?)),
            None => Ok(None),
        }
    }

    /// Creates an error frame.
    pub fn error(id: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            msg_type: MessageType::Error,
            payload: None,
            error: Some(WsError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Creates a successful, payload-less completion for this invocation.
    pub fn complete(&self) -> Self {
        Self {
            id: self.id.clone(),
            msg_type: MessageType::Completion,
            payload: None,
            error: None,
        }
    }

    /// Creates a failed completion for this invocation.
    pub fn complete_with_error(&self, code: i32, message: impl Into<String>) -> Self {
        Self {
            error: Some(WsError {
                code,
                message: message.into(),
            }),
            ..self.complete()
        }
    }

    /// Creates a response frame for this request.
    pub fn reply<T: Serialize>(
        &self,
        msg_type: MessageType,
        payload: Option<&T>,
    ) -> Result<Self, serde_json::Error> {
        Envelope::new(&self.id, msg_type, payload)
    }
}
