//! Client-hub handshake.

use tracing::warn;

use hubchat_protocol::constants::{
    MessageType, PROTOCOL_VERSION, ProtocolCompatibility, check_protocol_compatibility,
};
use hubchat_protocol::messages::{HandshakeAck, HandshakeRequest};

use crate::ws_client::{HubClient, WsError};

/// Performs the handshake on a freshly opened socket.
///
/// Any reply other than a compatible `handshake_ack` is reported as
/// [`WsError::Negotiation`] so callers can tell "hub unreachable" apart
/// from "hub reachable but refused us".
pub(crate) async fn perform_handshake(
    client: &HubClient,
    hello: &HandshakeRequest,
) -> Result<HandshakeAck, WsError> {
    let resp = match client
        .send_request(MessageType::Handshake, Some(hello))
        .await
    {
        Ok(resp) => resp,
        Err(WsError::Hub { code, message }) => {
            return Err(WsError::Negotiation(format!(
                "hub refused handshake ({code}): {message}"
            )));
        }
        Err(e) => return Err(e),
    };

    if resp.msg_type != MessageType::HandshakeAck {
        return Err(WsError::Negotiation(format!(
            "expected handshake_ack, got {:?}",
            resp.msg_type
        )));
    }

    let ack = resp
        .parse_payload::<HandshakeAck>()
        .map_err(|e| WsError::Negotiation(format!("malformed handshake_ack: {e}")))?
        .ok_or_else(|| WsError::Negotiation("empty handshake_ack".into()))?;

    match check_protocol_compatibility(ack.protocol_version) {
        ProtocolCompatibility::Compatible => {}
        ProtocolCompatibility::Deprecated { peer_version } => {
            warn!(
                peer_version,
                "hub protocol v{peer_version} is deprecated (current: v{PROTOCOL_VERSION})"
            );
        }
        ProtocolCompatibility::Incompatible { reason, .. } => {
            return Err(WsError::Negotiation(reason));
        }
    }

    Ok(ack)
}
