//! The conversation the user is looking at.

use std::sync::{PoisonError, RwLock};

use hubchat_protocol::messages::ChatMessage;
use hubchat_protocol::types::{ChatId, UserId};

/// External conversation state.
///
/// Supplies the identities `send` needs and receives inbound messages.
/// Implementations decide what to do with messages for other chats and
/// how much history to keep.
pub trait ConversationState: Send + Sync {
    fn current_user(&self) -> Option<UserId>;

    fn selected_chat(&self) -> Option<ChatId>;

    /// Called once per inbound message, in arrival order.
    fn append_message(&self, message: ChatMessage);
}

/// A conversation kept in memory. Appends every message it is given.
#[derive(Debug, Default)]
pub struct InMemoryConversation {
    inner: RwLock<Conversation>,
}

#[derive(Debug, Default)]
struct Conversation {
    user: Option<UserId>,
    chat: Option<ChatId>,
    log: Vec<ChatMessage>,
}

impl InMemoryConversation {
    pub fn new(user: Option<UserId>, chat: Option<ChatId>) -> Self {
        Self {
            inner: RwLock::new(Conversation {
                user,
                chat,
                log: Vec::new(),
            }),
        }
    }

    pub fn set_user(&self, user: Option<UserId>) {
        self.write().user = user;
    }

    pub fn select_chat(&self, chat: Option<ChatId>) {
        self.write().chat = chat;
    }

    /// Snapshot of the message log.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.read().log.clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Conversation> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Conversation> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConversationState for InMemoryConversation {
    fn current_user(&self) -> Option<UserId> {
        self.read().user.clone()
    }

    fn selected_chat(&self) -> Option<ChatId> {
        self.read().chat.clone()
    }

    fn append_message(&self, message: ChatMessage) {
        self.write().log.push(message);
    }
}
