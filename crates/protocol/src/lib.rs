pub mod constants;
pub mod envelope;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::MessageType;
pub use envelope::{Envelope, WsError};
pub use messages::{ChatMessage, HandshakeAck, HandshakeRequest, SendMessageRequest};
pub use types::{ChatId, MessageId, UserId};
