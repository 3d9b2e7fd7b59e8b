//! Background WebSocket loop for one PeerJS registration.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use screenbeam_common::{PeerId, SignalingErrorKind};
use screenbeam_config::schema::SignalingConfig;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use super::types::{event_for, ws_url, ClientMessage, ServerMessage};
use crate::input::SignalSink;
use crate::signaling::SignalEvent;

/// Commands from the link handle to its connection task.
#[derive(Debug)]
pub(crate) enum LinkCommand {
    /// Reopen a dropped socket under the same identity.
    Reconnect,
    /// Close the socket and end the task.
    Destroy,
}

/// How one socket session ended.
enum Outcome {
    /// Transport dropped; the identity can be reclaimed.
    Dropped,
    /// The server refused the registration.
    Refused,
    Destroyed,
}

// ---------------------------------------------------------------------------
// Connection Loop
// ---------------------------------------------------------------------------

/// Owns the socket for `id`. After a drop it waits for `Reconnect` rather
/// than retrying on its own; the session decides when to reconnect.
pub(crate) async fn connection_loop(
    config: SignalingConfig,
    id: PeerId,
    token: String,
    sink: SignalSink,
    mut command_rx: mpsc::UnboundedReceiver<LinkCommand>,
) {
    let url = match ws_url(&config, &id, &token) {
        Ok(url) => url,
        Err(e) => {
            error!(error = %e, "Invalid signaling endpoint");
            sink.emit(SignalEvent::Error {
                kind: SignalingErrorKind::ServerError,
                message: e.to_string(),
            });
            return;
        }
    };
    let connect_timeout = Duration::from_secs(u64::from(config.connect_timeout_secs));

    loop {
        info!(
            host = %config.host,
            port = config.port,
            peer = %id,
            "Connecting to PeerJS server"
        );

        match tokio::time::timeout(
            connect_timeout,
            tokio_tungstenite::connect_async(url.as_str()),
        )
        .await
        {
            Ok(Ok((ws_stream, _))) => {
                let (ws_write, ws_read) = ws_stream.split();
                let ws_write = Arc::new(Mutex::new(ws_write));

                let heartbeat_handle = tokio::spawn(heartbeat_task(
                    Arc::clone(&ws_write),
                    config.heartbeat_interval_ms,
                ));

                let outcome = read_loop(
                    ws_read,
                    &ws_write,
                    &mut command_rx,
                    &sink,
                    &id,
                    &config.key,
                )
                .await;

                heartbeat_handle.abort();
                match outcome {
                    Outcome::Destroyed => {
                        info!(peer = %id, "PeerJS registration destroyed");
                        return;
                    }
                    Outcome::Refused => {
                        warn!(peer = %id, "PeerJS server refused registration");
                        return;
                    }
                    Outcome::Dropped => {
                        warn!(peer = %id, "PeerJS socket dropped");
                        sink.emit(SignalEvent::Disconnected);
                    }
                }
            }
            Ok(Err(e)) => {
                error!(error = %e, "Failed to connect to PeerJS server");
                sink.emit(SignalEvent::Error {
                    kind: SignalingErrorKind::Network,
                    message: format!("Connection failed: {e}"),
                });
            }
            Err(_elapsed) => {
                error!(secs = config.connect_timeout_secs, "PeerJS connection timed out");
                sink.emit(SignalEvent::Error {
                    kind: SignalingErrorKind::Network,
                    message: format!(
                        "Connection timed out after {}s",
                        config.connect_timeout_secs
                    ),
                });
            }
        }

        // Wait for the owner to ask for another attempt.
        loop {
            match command_rx.recv().await {
                Some(LinkCommand::Reconnect) => break,
                Some(LinkCommand::Destroy) | None => return,
            }
        }
    }
}

async fn read_loop<R, W>(
    mut ws_read: R,
    ws_write: &Arc<Mutex<W>>,
    command_rx: &mut mpsc::UnboundedReceiver<LinkCommand>,
    sink: &SignalSink,
    id: &PeerId,
    key: &str,
) -> Outcome
where
    R: futures_util::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>>
        + Unpin,
    W: futures_util::Sink<WsMessage> + Unpin,
{
    loop {
        tokio::select! {
            msg = ws_read.next() => match msg {
                Some(Ok(WsMessage::Text(text))) => {
                    let Ok(server_msg) = serde_json::from_str::<ServerMessage>(&text) else {
                        debug!(text = %text.as_str(), "Unrecognized message from PeerJS server");
                        continue;
                    };
                    let Some(event) = event_for(&server_msg, id, key) else {
                        debug!(kind = ?server_msg.kind, "PeerJS message without registration effect");
                        continue;
                    };
                    let refused = matches!(
                        &event,
                        SignalEvent::Error { kind, .. } if kind.is_fatal()
                    );
                    if !sink.emit(event) {
                        return Outcome::Destroyed;
                    }
                    if refused {
                        let _ = ws_write.lock().await.send(WsMessage::Close(None)).await;
                        return Outcome::Refused;
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => return Outcome::Dropped,
                Some(Err(e)) => {
                    warn!(error = %e, "PeerJS WebSocket error");
                    return Outcome::Dropped;
                }
                Some(Ok(_)) => {}
            },
            cmd = command_rx.recv() => match cmd {
                Some(LinkCommand::Reconnect) => debug!("Reconnect ignored, socket is open"),
                Some(LinkCommand::Destroy) | None => {
                    let _ = ws_write.lock().await.send(WsMessage::Close(None)).await;
                    return Outcome::Destroyed;
                }
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Heartbeat
// ---------------------------------------------------------------------------

async fn heartbeat_task<S>(ws_write: Arc<Mutex<S>>, interval_ms: u32)
where
    S: futures_util::Sink<WsMessage> + Unpin,
{
    let period = Duration::from_millis(u64::from(interval_ms.max(1)));
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    loop {
        interval.tick().await;
        if let Ok(json) = serde_json::to_string(&ClientMessage::heartbeat()) {
            let mut writer = ws_write.lock().await;
            if writer.send(WsMessage::Text(json.into())).await.is_err() {
                break;
            }
        }
    }
}
