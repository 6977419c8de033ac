//! WebSocket client for client-to-hub communication.
//!
//! Implements invocation/completion with UUID correlation, application-level
//! keepalive, and push event delivery through a [`LinkEvent`] channel.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use hubchat_protocol::constants::{
    MessageType, PROTOCOL_VERSION, WS_HANDSHAKE_TIMEOUT, WS_MAX_MESSAGE_SIZE, WS_REQUEST_TIMEOUT,
};
use hubchat_protocol::envelope::Envelope;
use hubchat_protocol::messages::{HandshakeRequest, SendMessageRequest};

use crate::factory::Endpoint;
use crate::transport::{Connector, Link, LinkEvent, Session};

/// Errors from the WebSocket client.
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request timed out")]
    Timeout,

    #[error("connection closed")]
    Closed,

    #[error("failed to negotiate with the hub: {0}")]
    Negotiation(String),

    #[error("hub error {code}: {message}")]
    Hub { code: i32, message: String },
}

impl WsError {
    /// Returns `true` if the hub was reachable but the handshake failed.
    pub fn is_negotiation(&self) -> bool {
        matches!(self, Self::Negotiation(_))
    }
}

/// In-flight invocations keyed by envelope ID.
pub(crate) type PendingRequests = Arc<Mutex<HashMap<String, oneshot::Sender<Envelope>>>>;

/// Capacity of the per-link inbound event channel.
const LINK_EVENT_CAPACITY: usize = 256;

/// WebSocket client connected to a single hub.
///
/// Returned from [`HubClient::connect`] only after the handshake succeeded.
pub struct HubClient {
    write_tx: mpsc::Sender<tungstenite::Message>,
    pending: PendingRequests,
    connection_id: String,
    _read_handle: tokio::task::JoinHandle<()>,
    _write_handle: tokio::task::JoinHandle<()>,
    _ping_handle: tokio::task::JoinHandle<()>,
    cancel: CancellationToken,
}

impl HubClient {
    /// Connects to the hub WebSocket and performs the handshake.
    ///
    /// Returns the client together with the receiver for its inbound events.
    pub async fn connect(
        url: &str,
        hello: &HandshakeRequest,
    ) -> Result<(Self, mpsc::Receiver<LinkEvent>), WsError> {
        let mut ws_config = tungstenite::protocol::WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);
        let (ws_stream, _) =
            tokio_tungstenite::connect_async_with_config(url, Some(ws_config), false).await?;
        let (write, read) = ws_stream.split();

        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(256);
        let (events_tx, events_rx) = mpsc::channel::<LinkEvent>(LINK_EVENT_CAPACITY);
        let pending: PendingRequests = Arc::new(Mutex::new(HashMap::new()));
        let cancel = CancellationToken::new();

        let write_handle = {
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::write::write_pump(write, write_rx, cancel))
        };

        let read_handle = {
            let pending = pending.clone();
            let write_tx = write_tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::read::read_pump(
                read, pending, events_tx, write_tx, cancel,
            ))
        };

        let ping_handle = {
            let write_tx = write_tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::ping::ping_pump(write_tx, cancel))
        };

        let mut client = Self {
            write_tx,
            pending,
            connection_id: String::new(),
            _read_handle: read_handle,
            _write_handle: write_handle,
            _ping_handle: ping_handle,
            cancel,
        };

        let ack = match tokio::time::timeout(
            WS_HANDSHAKE_TIMEOUT,
            crate::handshake::perform_handshake(&client, hello),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(WsError::Negotiation(
                    "hub did not answer the handshake".into(),
                ));
            }
        };
        client.connection_id = ack.connection_id;
        debug!(url, connection_id = %client.connection_id, "hub handshake complete");

        Ok((client, events_rx))
    }

    /// Connection ID assigned by the hub during the handshake (may be empty).
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Sends a request frame and waits for the frame carrying the same ID.
    pub(crate) async fn send_request<T: serde::Serialize>(
        &self,
        msg_type: MessageType,
        payload: Option<&T>,
    ) -> Result<Envelope, WsError> {
        let id = uuid::Uuid::new_v4().to_string();
        let envelope = Envelope::new(&id, msg_type, payload)?;
        let json = serde_json::to_string(&envelope)?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        if self
            .write_tx
            .send(tungstenite::Message::Text(json.into()))
            .await
            .is_err()
        {
            self.pending.lock().await.remove(&id);
            return Err(WsError::Closed);
        }

        let result = tokio::time::timeout(WS_REQUEST_TIMEOUT, rx).await;

        // Clean up pending entry on any exit path.
        self.pending.lock().await.remove(&id);

        match result {
            Ok(Ok(resp)) => {
                if let Some(err) = &resp.error {
                    return Err(WsError::Hub {
                        code: err.code,
                        message: err.message.clone(),
                    });
                }
                Ok(resp)
            }
            Ok(Err(_)) => Err(WsError::Closed),
            Err(_) => Err(WsError::Timeout),
        }
    }
}

impl Link for HubClient {
    async fn invoke(&self, request: &SendMessageRequest) -> Result<(), WsError> {
        let resp = self
            .send_request(MessageType::SendMessage, Some(request))
            .await?;
        match resp.msg_type {
            MessageType::Completion => Ok(()),
            other => Err(WsError::Hub {
                code: hubchat_protocol::constants::WS_ERR_CODE_INTERNAL,
                message: format!("unexpected reply to SendMessage: {other:?}"),
            }),
        }
    }

    /// Gracefully closes the connection.
    async fn close(&self) {
        self.cancel.cancel();
        let _ = self.write_tx.send(tungstenite::Message::Close(None)).await;
    }
}

impl Drop for HubClient {
    fn drop(&mut self) {
        self.cancel.cancel();
        self._read_handle.abort();
        self._write_handle.abort();
        self._ping_handle.abort();
    }
}

/// Opens [`HubClient`] links, identifying as `client_name`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    hello: HandshakeRequest,
}

impl WsConnector {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            hello: HandshakeRequest {
                protocol_version: PROTOCOL_VERSION,
                client_name: client_name.into(),
                client_version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new("hubchat")
    }
}

impl Connector for WsConnector {
    type Link = HubClient;

    async fn connect(&self, endpoint: &Endpoint) -> Result<Session<HubClient>, WsError> {
        let (client, events) = HubClient::connect(endpoint.as_str(), &self.hello).await?;
        Ok(Session {
            link: Arc::new(client),
            events,
        })
    }
}
