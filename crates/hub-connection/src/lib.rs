//! Connection lifecycle for the HubChat client.
//!
//! Builds a hub connection from a URL, drives it through initial connect
//! and mid-session recovery, delivers inbound messages into the
//! conversation and gates outbound sends on the connection state.

mod channel;
pub mod conversation;
pub mod error;
pub mod factory;
mod handshake;
pub mod manager;
pub mod policy;
mod pumps;
mod reconnection;
pub mod transport;
pub mod types;
pub mod ws_client;

#[cfg(test)]
pub(crate) mod testing;

pub use channel::MessageChannel;
pub use conversation::{ConversationState, InMemoryConversation};
pub use error::{ConnectionError, SendError};
pub use factory::{ConnectionHandle, Endpoint, HubConnectionFactory};
pub use manager::{ConnectionLifecycleManager, LifecycleEvents};
pub use policy::{InitialConnectPolicy, MidSessionPolicy, ReconnectPolicy};
pub use transport::{Connector, Link, LinkEvent, Session};
pub use types::{ConnectionState, LifecycleEvent};
pub use ws_client::{HubClient, WsConnector, WsError};
