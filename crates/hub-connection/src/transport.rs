//! Transport seam between the lifecycle manager and the wire.
//!
//! [`WsConnector`](crate::ws_client::WsConnector) is the production
//! implementation; anything that can open a session to an [`Endpoint`] and
//! push [`LinkEvent`]s can stand in for it.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use hubchat_protocol::messages::{ChatMessage, SendMessageRequest};

use crate::factory::Endpoint;
use crate::ws_client::WsError;

/// Something that happened on an open link.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// The hub pushed a chat message.
    Message(ChatMessage),
    /// The link is dead; the string describes why.
    Dropped(String),
}

/// An open link plus the receiving half of its event stream.
///
/// The receiver is the link's single inbound subscription; dropping it
/// unregisters the subscription.
pub struct Session<L> {
    pub link: Arc<L>,
    pub events: mpsc::Receiver<LinkEvent>,
}

/// An established, handshaken connection to the hub.
pub trait Link: Send + Sync + 'static {
    /// Invokes the hub's `SendMessage` method once and waits for its
    /// completion.
    fn invoke(
        &self,
        request: &SendMessageRequest,
    ) -> impl Future<Output = Result<(), WsError>> + Send;

    /// Closes the link. Does not emit [`LinkEvent::Dropped`].
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// Opens links to a hub endpoint.
pub trait Connector: Send + Sync + 'static {
    type Link: Link;

    /// Performs one connection attempt, including the handshake.
    fn connect(
        &self,
        endpoint: &Endpoint,
    ) -> impl Future<Output = Result<Session<Self::Link>, WsError>> + Send;
}
