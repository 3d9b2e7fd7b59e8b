//! Registration handle for a PeerJS server.

use rand::distributions::Alphanumeric;
use rand::Rng;
use screenbeam_common::{PeerId, SessionError, SignalingErrorKind};
use screenbeam_config::schema::SignalingConfig;
use tokio::sync::mpsc;
use tracing::debug;

use super::connection::{connection_loop, LinkCommand};
use crate::input::SignalSink;
use crate::media::MediaStream;
use crate::signaling::{CallId, ChannelId, Signaling};

const TOKEN_LEN: usize = 10;

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

/// Keeps an identity registered on a PeerJS server: opens the socket,
/// heartbeats it, reports `open`/`error`/`disconnected` and reconnects on
/// request.
///
/// Data channels and calls are negotiated peer to peer by a media engine,
/// which this link does not carry; those operations fail with `webrtc`.
pub struct PeerServerLink {
    config: SignalingConfig,
    id: Option<PeerId>,
    command_tx: Option<mpsc::UnboundedSender<LinkCommand>>,
}

impl PeerServerLink {
    pub fn new(config: SignalingConfig) -> Self {
        Self {
            config,
            id: None,
            command_tx: None,
        }
    }

    pub fn id(&self) -> Option<&PeerId> {
        self.id.as_ref()
    }

    pub fn is_registered(&self) -> bool {
        self.command_tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    fn command(&self, command: LinkCommand) -> Result<(), SessionError> {
        self.command_tx
            .as_ref()
            .and_then(|tx| tx.send(command).ok())
            .ok_or_else(|| {
                SessionError::signaling(SignalingErrorKind::Disconnected, "not registered")
            })
    }
}

fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

fn no_media_engine() -> SessionError {
    SessionError::signaling(
        SignalingErrorKind::Webrtc,
        "peer connections need a media engine",
    )
}

impl Signaling for PeerServerLink {
    fn register(&mut self, id: Option<PeerId>, sink: SignalSink) -> Result<(), SessionError> {
        self.destroy();

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            SessionError::signaling(SignalingErrorKind::SocketError, e.to_string())
        })?;
        let id = id.unwrap_or_else(PeerId::anonymous);
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        runtime.spawn(connection_loop(
            self.config.clone(),
            id.clone(),
            random_token(),
            sink,
            command_rx,
        ));
        debug!(peer = %id, "PeerJS registration started");
        self.id = Some(id);
        self.command_tx = Some(command_tx);
        Ok(())
    }

    fn connect(&mut self, _target: &PeerId) -> Result<ChannelId, SessionError> {
        Err(no_media_engine())
    }

    fn send(&mut self, _channel: ChannelId, _payload: &str) -> Result<(), SessionError> {
        Err(no_media_engine())
    }

    fn close_channel(&mut self, _channel: ChannelId) {}

    fn call(&mut self, _target: &PeerId, _stream: &MediaStream) -> Result<CallId, SessionError> {
        Err(no_media_engine())
    }

    fn answer(&mut self, _call: CallId) -> Result<(), SessionError> {
        Err(no_media_engine())
    }

    fn hang_up(&mut self, _call: CallId) {}

    fn reconnect(&mut self) -> Result<(), SessionError> {
        self.command(LinkCommand::Reconnect)
    }

    fn destroy(&mut self) {
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(LinkCommand::Destroy);
        }
        self.id = None;
    }
}

impl Drop for PeerServerLink {
    fn drop(&mut self) {
        self.destroy();
    }
}
