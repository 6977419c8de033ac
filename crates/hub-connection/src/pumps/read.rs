//! WebSocket read pump: routes completions and forwards hub pushes.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use hubchat_protocol::constants::{MessageType, WS_MAX_MESSAGE_SIZE, WS_SERVER_TIMEOUT};
use hubchat_protocol::envelope::Envelope;
use hubchat_protocol::messages::ChatMessage;

use crate::transport::LinkEvent;
use crate::ws_client::PendingRequests;

/// Reads frames from the WebSocket until the link dies or is cancelled.
///
/// Any inbound frame resets a [`WS_SERVER_TIMEOUT`] deadline; if the hub
/// goes silent for that long the link is treated as dropped. On every exit
/// path in-flight requests are failed. A [`LinkEvent::Dropped`] is emitted
/// unless the exit was caused by cancellation (a local close).
pub(crate) async fn read_pump<S>(
    mut read: S,
    pending: PendingRequests,
    events_tx: mpsc::Sender<LinkEvent>,
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    let deadline = tokio::time::sleep(WS_SERVER_TIMEOUT);
    tokio::pin!(deadline);

    let reason = loop {
        tokio::select! {
            _ = cancel.cancelled() => break None,

            () = &mut deadline => {
                warn!("hub silent for {}s, treating connection as dropped", WS_SERVER_TIMEOUT.as_secs());
                break Some(format!("no frames from hub within {}s", WS_SERVER_TIMEOUT.as_secs()));
            }

            frame = read.next() => {
                match frame {
                    Some(Ok(frame)) => {
                        deadline.as_mut().reset(tokio::time::Instant::now() + WS_SERVER_TIMEOUT);

                        match frame {
                            tungstenite::Message::Text(text) => {
                                handle_text_frame(&text, &pending, &events_tx, &write_tx).await;
                            }
                            tungstenite::Message::Ping(data) => {
                                trace!("received ping, sending pong");
                                let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                            }
                            tungstenite::Message::Close(frame) => {
                                let detail = frame
                                    .map(|f| format!("hub closed connection ({}): {}", u16::from(f.code), f.reason.as_str()))
                                    .unwrap_or_else(|| "hub closed connection".into());
                                debug!("{detail}");
                                break Some(detail);
                            }
                            _ => {} // Binary and Pong: liveness only.
                        }
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {e}");
                        break Some(format!("read error: {e}"));
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break Some("stream ended".into());
                    }
                }
            }
        }
    };

    // Dropping the senders fails every waiting request with `Closed`.
    pending.lock().await.clear();

    if let Some(reason) = reason {
        let _ = events_tx.send(LinkEvent::Dropped(reason)).await;
    }
}

/// Handles a text frame from the hub.
async fn handle_text_frame(
    text: &str,
    pending: &PendingRequests,
    events_tx: &mpsc::Sender<LinkEvent>,
    write_tx: &mpsc::Sender<tungstenite::Message>,
) {
    if text.len() > WS_MAX_MESSAGE_SIZE {
        warn!("frame too large ({} bytes), dropping", text.len());
        return;
    }

    let envelope: Envelope = match serde_json::from_str(text) {
        Ok(e) => e,
        Err(e) => {
            warn!("failed to parse frame: {e}");
            return;
        }
    };

    trace!(msg_type = ?envelope.msg_type, id = %envelope.id, "received frame");

    // Route completions to the waiting request.
    if let Some(tx) = pending.lock().await.remove(&envelope.id) {
        let _ = tx.send(envelope);
        return;
    }

    match envelope.msg_type {
        MessageType::ReceiveMessage => match envelope.parse_payload::<ChatMessage>() {
            Ok(Some(message)) => {
                if events_tx.send(LinkEvent::Message(message)).await.is_err() {
                    debug!("inbound subscription gone, dropping message");
                }
            }
            Ok(None) => warn!(id = %envelope.id, "ReceiveMessage without payload"),
            Err(e) => warn!(id = %envelope.id, "malformed ReceiveMessage payload: {e}"),
        },
        MessageType::Ping => {
            if let Ok(pong) = envelope.reply::<()>(MessageType::Pong, None)
                && let Ok(json) = serde_json::to_string(&pong)
            {
                let _ = write_tx.send(tungstenite::Message::Text(json.into())).await;
            }
        }
        MessageType::Pong => trace!("received pong"),
        MessageType::Error => {
            if let Some(err) = &envelope.error {
                warn!(code = err.code, "hub error: {}", err.message);
            }
        }
        other => debug!(msg_type = ?other, id = %envelope.id, "ignoring unsolicited frame"),
    }
}
