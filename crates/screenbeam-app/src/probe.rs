//! Registration probe against the configured PeerJS server.

use screenbeam_common::{generate_sender_id, PeerId, SessionError, SignalingErrorKind, Stage};
use screenbeam_config::ScreenbeamConfig;
use screenbeam_session::peerjs::PeerServerLink;
use screenbeam_session::{InputReceiver, SessionInput, SignalEvent, SignalSink, Signaling};
use tracing::{info, warn};

/// Register `id` (or a fresh sender identity) and wait for the server's
/// verdict within the registration timeout. The registration is released
/// before returning.
pub async fn run(config: &ScreenbeamConfig, id: Option<String>) -> Result<PeerId, SessionError> {
    let id = match id {
        Some(id) => PeerId::new(id),
        None => generate_sender_id(&config.share.id_prefix),
    };
    let mut link = PeerServerLink::new(config.signaling.clone());
    let (sink, mut rx) = SignalSink::detached();
    link.register(Some(id.clone()), sink)?;
    info!(
        peer = %id,
        host = %config.signaling.host,
        port = config.signaling.port,
        "Probing signaling server"
    );

    let outcome = tokio::time::timeout(config.timeouts.registration(), verdict(&mut rx)).await;
    link.destroy();

    match outcome {
        Ok(Ok(opened)) => {
            info!(peer = %opened, "Signaling registration open");
            Ok(opened)
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Signaling registration failed");
            Err(e)
        }
        Err(_elapsed) => Err(SessionError::Timeout {
            stage: Stage::Registration,
        }),
    }
}

async fn verdict(rx: &mut InputReceiver) -> Result<PeerId, SessionError> {
    while let Some(stamped) = rx.recv().await {
        match stamped.input {
            SessionInput::Signal(SignalEvent::Open { id }) => return Ok(id),
            SessionInput::Signal(SignalEvent::Error { kind, message }) => {
                return Err(SessionError::signaling(kind, message))
            }
            SessionInput::Signal(SignalEvent::Disconnected) => {
                return Err(SessionError::signaling(
                    SignalingErrorKind::Disconnected,
                    "socket closed before registration",
                ))
            }
            _ => {}
        }
    }
    Err(SessionError::signaling(
        SignalingErrorKind::SocketClosed,
        "registration ended without a verdict",
    ))
}
