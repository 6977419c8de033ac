//! WebSocket write pump: serialises outbound frames onto the socket.

use futures_util::SinkExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::error;

use hubchat_protocol::constants::WS_WRITE_WAIT;

/// Writes queued frames to the WebSocket, each within [`WS_WRITE_WAIT`].
///
/// A failed or stalled write ends the pump; the read side then observes the
/// broken socket and reports the drop.
pub(crate) async fn write_pump<S>(
    mut write: S,
    mut write_rx: mpsc::Receiver<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            frame = write_rx.recv() => {
                let Some(frame) = frame else { break };
                match tokio::time::timeout(WS_WRITE_WAIT, write.send(frame)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        error!("WebSocket write error: {e}");
                        break;
                    }
                    Err(_) => {
                        error!("WebSocket write stalled for {}s", WS_WRITE_WAIT.as_secs());
                        break;
                    }
                }
            }
        }
    }

    let _ = write.send(tungstenite::Message::Close(None)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::sink;

    fn channel_sink(
        tx: mpsc::Sender<tungstenite::Message>,
    ) -> impl SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin {
        Box::pin(sink::unfold(tx, |tx, msg: tungstenite::Message| async move {
            let _ = tx.send(msg).await;
            Ok::<_, tungstenite::Error>(tx)
        }))
    }

    #[tokio::test]
    async fn frames_are_written_in_order() {
        let (sink_tx, mut sink_rx) = mpsc::channel::<tungstenite::Message>(16);
        let (write_tx, write_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        write_tx.send(tungstenite::Message::Text("a".into())).await.unwrap();
        write_tx.send(tungstenite::Message::Text("b".into())).await.unwrap();
        drop(write_tx);

        write_pump(channel_sink(sink_tx), write_rx, cancel).await;

        assert_eq!(sink_rx.recv().await, Some(tungstenite::Message::Text("a".into())));
        assert_eq!(sink_rx.recv().await, Some(tungstenite::Message::Text("b".into())));
        assert!(matches!(sink_rx.recv().await, Some(tungstenite::Message::Close(_))));
    }

    #[tokio::test]
    async fn write_pump_stops_on_cancel() {
        let (sink_tx, mut sink_rx) = mpsc::channel::<tungstenite::Message>(16);
        let cancel = CancellationToken::new();

        let (_write_tx, write_rx) = mpsc::channel(16);
        let c = cancel.clone();
        let handle = tokio::spawn(async move {
            write_pump(channel_sink(sink_tx), write_rx, c).await;
        });

        cancel.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("should stop")
            .expect("no panic");

        let close_msg = sink_rx.recv().await;
        assert!(matches!(close_msg, Some(tungstenite::Message::Close(_))));
    }
}
