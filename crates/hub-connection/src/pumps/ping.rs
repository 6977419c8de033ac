//! Keepalive pump: periodic application-level pings to the hub.

use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use hubchat_protocol::constants::{MessageType, WS_PING_PERIOD};
use hubchat_protocol::envelope::Envelope;

/// Sends a `ping` envelope every [`WS_PING_PERIOD`].
///
/// The hub's replies (or any other traffic) keep the read pump's
/// server-timeout deadline from expiring.
pub(crate) async fn ping_pump(
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(WS_PING_PERIOD);
    interval.tick().await; // Skip immediate first tick.

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let frame = match ping_frame() {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("failed to encode ping: {e}");
                        continue;
                    }
                };
                if write_tx.send(frame).await.is_err() {
                    break;
                }
            }
        }
    }
}

fn ping_frame() -> Result<tungstenite::Message, serde_json::Error> {
    let ping = Envelope::new::<()>(uuid::Uuid::new_v4().to_string(), MessageType::Ping, None)?;
    Ok(tungstenite::Message::Text(serde_json::to_string(&ping)?.into()))
}
