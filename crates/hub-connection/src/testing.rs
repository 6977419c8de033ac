//! Transport doubles and a loopback hub for tests.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite;

use hubchat_protocol::constants::{MessageType, PROTOCOL_VERSION};
use hubchat_protocol::envelope::Envelope;
use hubchat_protocol::messages::{ChatMessage, HandshakeAck, SendMessageRequest};
use hubchat_protocol::types::{ChatId, MessageId, UserId};

use crate::factory::Endpoint;
use crate::transport::{Connector, Link, LinkEvent, Session};
use crate::ws_client::WsError;

/// What the next connect attempt does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Socket-level failure (connection refused).
    Fail,
    /// Hub reachable but refused the handshake.
    Negotiation,
    Succeed,
}

/// A connector that plays back a script of outcomes, then repeats
/// `fallback` forever.
#[derive(Clone)]
pub(crate) struct ScriptedConnector {
    inner: Arc<ScriptInner>,
}

struct ScriptInner {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    attempts: Mutex<Vec<Instant>>,
    sessions: Mutex<Vec<(Arc<MockLink>, mpsc::Sender<LinkEvent>)>>,
}

impl ScriptedConnector {
    pub(crate) fn new(script: impl IntoIterator<Item = Outcome>, fallback: Outcome) -> Self {
        Self {
            inner: Arc::new(ScriptInner {
                script: Mutex::new(script.into_iter().collect()),
                fallback,
                attempts: Mutex::new(Vec::new()),
                sessions: Mutex::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn always(outcome: Outcome) -> Self {
        Self::new(Vec::new(), outcome)
    }

    /// Instants at which each connect attempt started.
    pub(crate) fn attempts(&self) -> Vec<Instant> {
        lock(&self.inner.attempts).clone()
    }

    pub(crate) fn attempt_count(&self) -> usize {
        lock(&self.inner.attempts).len()
    }

    /// Gaps between consecutive attempts, in milliseconds.
    pub(crate) fn gaps_ms(&self) -> Vec<u128> {
        self.attempts()
            .windows(2)
            .map(|w| (w[1] - w[0]).as_millis())
            .collect()
    }

    pub(crate) fn session_count(&self) -> usize {
        lock(&self.inner.sessions).len()
    }

    /// The link handed out by the `n`th successful attempt.
    pub(crate) fn link(&self, n: usize) -> Arc<MockLink> {
        Arc::clone(&lock(&self.inner.sessions)[n].0)
    }

    fn events_tx(&self, n: usize) -> mpsc::Sender<LinkEvent> {
        lock(&self.inner.sessions)[n].1.clone()
    }

    /// Pushes a hub message on the `n`th link. Returns `false` if nobody
    /// is subscribed any more.
    pub(crate) async fn push(&self, n: usize, message: ChatMessage) -> bool {
        self.events_tx(n)
            .send(LinkEvent::Message(message))
            .await
            .is_ok()
    }

    /// Reports the `n`th link as dropped by the hub.
    pub(crate) async fn drop_link(&self, n: usize) {
        let _ = self
            .events_tx(n)
            .send(LinkEvent::Dropped("hub went away".into()))
            .await;
    }
}

impl Connector for ScriptedConnector {
    type Link = MockLink;

    async fn connect(&self, _endpoint: &Endpoint) -> Result<Session<MockLink>, WsError> {
        lock(&self.inner.attempts).push(Instant::now());
        let outcome = lock(&self.inner.script)
            .pop_front()
            .unwrap_or(self.inner.fallback);

        match outcome {
            Outcome::Fail => Err(WsError::Ws(tungstenite::Error::Io(std::io::Error::from(
                std::io::ErrorKind::ConnectionRefused,
            )))),
            Outcome::Negotiation => Err(WsError::Negotiation("hub refused handshake".into())),
            Outcome::Succeed => {
                let (tx, rx) = mpsc::channel(16);
                let link = Arc::new(MockLink::default());
                lock(&self.inner.sessions).push((Arc::clone(&link), tx));
                Ok(Session { link, events: rx })
            }
        }
    }
}

/// Link double that records invocations.
#[derive(Default)]
pub(crate) struct MockLink {
    invoked: Mutex<Vec<SendMessageRequest>>,
    reject: Mutex<Option<(i32, String)>>,
    broken: AtomicBool,
    closed: AtomicBool,
}

impl MockLink {
    pub(crate) fn invocations(&self) -> Vec<SendMessageRequest> {
        lock(&self.invoked).clone()
    }

    /// Makes every following invoke complete with a hub error.
    pub(crate) fn reject_with(&self, code: i32, message: &str) {
        *lock(&self.reject) = Some((code, message.into()));
    }

    /// Makes every following invoke fail at the transport level.
    pub(crate) fn break_transport(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Link for MockLink {
    async fn invoke(&self, request: &SendMessageRequest) -> Result<(), WsError> {
        lock(&self.invoked).push(request.clone());
        if self.broken.load(Ordering::SeqCst) {
            return Err(WsError::Closed);
        }
        if let Some((code, message)) = lock(&self.reject).clone() {
            return Err(WsError::Hub { code, message });
        }
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub(crate) fn chat_message(id: &str, content: &str) -> ChatMessage {
    ChatMessage {
        id: MessageId::from(id),
        content: content.into(),
        chat_id: ChatId::from("chat-1"),
        sender_id: UserId::from("user-2"),
        timestamp: chrono::Utc::now(),
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// How the loopback hub answers the handshake.
#[derive(Clone, Copy)]
pub(crate) enum HubBehavior {
    /// Ack, echo every SendMessage back as a ReceiveMessage push.
    Echo,
    /// Answer the handshake with an error frame.
    RejectHandshake,
    /// Ack with a protocol version we cannot speak.
    FutureProtocol,
    /// Ack, then close the socket.
    AckThenClose,
}

pub(crate) async fn spawn_hub(behavior: HubBehavior) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let (mut write, mut read) = ws.split();

        while let Some(Ok(frame)) = read.next().await {
            let tungstenite::Message::Text(text) = frame else {
                continue;
            };
            let env: Envelope = serde_json::from_str(&text).unwrap();
            let replies = match (env.msg_type.clone(), behavior) {
                (MessageType::Handshake, HubBehavior::RejectHandshake) => {
                    vec![Envelope::error(&env.id, 401, "unknown client")]
                }
                (MessageType::Handshake, HubBehavior::FutureProtocol) => {
                    let ack = HandshakeAck {
                        protocol_version: PROTOCOL_VERSION + 1,
                        connection_id: "c-future".into(),
                    };
                    vec![env.reply(MessageType::HandshakeAck, Some(&ack)).unwrap()]
                }
                (MessageType::Handshake, _) => {
                    let ack = HandshakeAck {
                        protocol_version: PROTOCOL_VERSION,
                        connection_id: "c-1".into(),
                    };
                    vec![env.reply(MessageType::HandshakeAck, Some(&ack)).unwrap()]
                }
                (MessageType::SendMessage, _) => {
                    let req: SendMessageRequest = env.parse_payload().unwrap().unwrap();
                    if req.content == "forbidden" {
                        vec![env.complete_with_error(403, "not a member")]
                    } else {
                        let msg = ChatMessage {
                            id: MessageId::from("m-1"),
                            content: req.content,
                            chat_id: req.chat_id,
                            sender_id: req.sender_id,
                            timestamp: chrono::Utc::now(),
                        };
                        vec![
                            env.complete(),
                            Envelope::new("push-1", MessageType::ReceiveMessage, Some(&msg))
                                .unwrap(),
                        ]
                    }
                }
                _ => Vec::new(),
            };
            for reply in replies {
                let json = serde_json::to_string(&reply).unwrap();
                write
                    .send(tungstenite::Message::Text(json.into()))
                    .await
                    .unwrap();
            }
            if matches!(behavior, HubBehavior::AckThenClose)
                && env.msg_type == MessageType::Handshake
            {
                let _ = write.send(tungstenite::Message::Close(None)).await;
                break;
            }
        }
    });
    addr
}
