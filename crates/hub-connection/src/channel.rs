//! Outbound sends and inbound delivery over the managed connection.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use hubchat_protocol::messages::SendMessageRequest;
use hubchat_protocol::types::{ChatId, UserId};

use crate::conversation::ConversationState;
use crate::error::SendError;
use crate::manager::Shared;
use crate::transport::{Connector, Link, LinkEvent};
use crate::types::ConnectionState;
use crate::ws_client::WsConnector;

/// Sends chat messages through a lifecycle manager's connection.
///
/// Obtained from
/// [`ConnectionLifecycleManager::channel`](crate::ConnectionLifecycleManager::channel).
/// Holds no connection of its own; every send looks up the current one.
pub struct MessageChannel<C: Connector = WsConnector> {
    shared: Arc<Shared<C>>,
}

impl<C: Connector> Clone for MessageChannel<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: Connector> MessageChannel<C> {
    pub(crate) fn new(shared: Arc<Shared<C>>) -> Self {
        Self { shared }
    }

    /// Sends `content` to `chat_id` as `sender_id`.
    ///
    /// Does nothing (and returns `Ok`) unless the connection is
    /// [`ConnectionState::Connected`], `content` has non-whitespace text and
    /// both ids are present. Otherwise invokes the hub exactly once; the
    /// message is never queued or retried.
    pub async fn send(
        &self,
        content: &str,
        chat_id: Option<&ChatId>,
        sender_id: Option<&UserId>,
    ) -> Result<(), SendError> {
        let (link, chat_id, sender_id) = {
            let inner = self.shared.inner.lock().await;
            let state = self.shared.state();
            if state != ConnectionState::Connected {
                debug!(%state, "not connected, message not sent");
                return Ok(());
            }
            if content.trim().is_empty() {
                debug!("empty message, not sent");
                return Ok(());
            }
            let (Some(chat_id), Some(sender_id)) = (chat_id, sender_id) else {
                debug!(
                    has_chat = chat_id.is_some(),
                    has_sender = sender_id.is_some(),
                    "missing chat or sender, message not sent"
                );
                return Ok(());
            };
            let Some(link) = inner.link.clone() else {
                return Ok(());
            };
            (link, chat_id.clone(), sender_id.clone())
        };

        let request = SendMessageRequest {
            content: content.to_string(),
            chat_id,
            sender_id,
        };
        trace!(chat = %request.chat_id, "invoking SendMessage");
        link.invoke(&request).await.map_err(SendError::from)
    }

    /// Sends `content` to the conversation's selected chat as its current
    /// user.
    pub async fn send_from(
        &self,
        conversation: &dyn ConversationState,
        content: &str,
    ) -> Result<(), SendError> {
        let chat = conversation.selected_chat();
        let user = conversation.current_user();
        self.send(content, chat.as_ref(), user.as_ref()).await
    }
}

/// The single inbound subscription of one connection lifetime.
///
/// Dropping it unregisters it: later pushes on the same link go nowhere.
pub(crate) struct InboundSubscription {
    events: mpsc::Receiver<LinkEvent>,
    conversation: Arc<dyn ConversationState>,
}

impl InboundSubscription {
    pub(crate) fn register(
        events: mpsc::Receiver<LinkEvent>,
        conversation: Arc<dyn ConversationState>,
    ) -> Self {
        Self {
            events,
            conversation,
        }
    }

    /// Appends pushed messages to the conversation until the link drops.
    ///
    /// Returns the drop reason, or `None` if `cancel` fired first.
    pub(crate) async fn run(mut self, cancel: &CancellationToken) -> Option<String> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return None,
                event = self.events.recv() => match event {
                    Some(LinkEvent::Message(message)) => {
                        trace!(id = %message.id, chat = %message.chat_id, "inbound message");
                        self.conversation.append_message(message);
                    }
                    Some(LinkEvent::Dropped(reason)) => return Some(reason),
                    None => return Some("link closed without reason".into()),
                },
            }
        }
    }
}
