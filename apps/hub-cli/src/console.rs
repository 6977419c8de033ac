//! Terminal input and output.

use std::fmt::Write as _;

use hubchat_hub_connection::{ConversationState, InMemoryConversation};
use hubchat_hub_notifications::{Toast, ToastType};
use hubchat_protocol::messages::ChatMessage;
use hubchat_protocol::types::{ChatId, UserId};

/// A line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text to send to the selected chat.
    Send(String),
    Chat(ChatId),
    User(UserId),
    Refresh,
    Quit,
    Help,
    /// A slash command we could not make sense of; carries a usage hint.
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Self::Send(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match (name, arg) {
            ("chat", "") => Self::Invalid("usage: /chat <id>".into()),
            ("chat", id) => Self::Chat(ChatId::from(id)),
            ("user", "") => Self::Invalid("usage: /user <id>".into()),
            ("user", id) => Self::User(UserId::from(id)),
            ("refresh", _) => Self::Refresh,
            ("quit" | "exit", _) => Self::Quit,
            ("help", _) => Self::Help,
            (other, _) => Self::Invalid(format!("unknown command /{other}, try /help")),
        }
    }
}

pub const HELP: &str = "\
/chat <id>   select a conversation
/user <id>   set your identity
/refresh     reconnect after the connection gave up
/quit        disconnect and exit
anything else is sent to the selected conversation";

/// In-memory conversation that also prints messages for the selected chat.
#[derive(Debug, Default)]
pub struct ConsoleConversation {
    log: InMemoryConversation,
}

impl ConsoleConversation {
    pub fn new(user: Option<UserId>, chat: Option<ChatId>) -> Self {
        Self {
            log: InMemoryConversation::new(user, chat),
        }
    }

    pub fn set_user(&self, user: UserId) {
        self.log.set_user(Some(user));
    }

    pub fn select_chat(&self, chat: ChatId) {
        self.log.select_chat(Some(chat));
    }
}

impl ConversationState for ConsoleConversation {
    fn current_user(&self) -> Option<UserId> {
        self.log.current_user()
    }

    fn selected_chat(&self) -> Option<ChatId> {
        self.log.selected_chat()
    }

    fn append_message(&self, message: ChatMessage) {
        if self.selected_chat().as_ref() == Some(&message.chat_id) {
            println!("{}", format_message(&message));
        }
        self.log.append_message(message);
    }
}

pub fn format_message(message: &ChatMessage) -> String {
    format!(
        "[{}] {}: {}",
        message.timestamp.format("%H:%M:%S"),
        message.sender_id,
        message.content
    )
}

pub fn format_toast(toast: &Toast) -> String {
    let tag = match toast.toast_type {
        ToastType::Success => "ok",
        ToastType::Error => "error",
        ToastType::Warning => "warn",
        ToastType::Info => "info",
    };
    let mut line = format!("*** [{tag}] {}", toast.title);
    if let Some(message) = &toast.message {
        let _ = write!(line, ": {message}");
    }
    line
}
