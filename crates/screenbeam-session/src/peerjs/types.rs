//! PeerJS server wire types.

use screenbeam_common::{ConfigError, PeerId, SignalingErrorKind};
use screenbeam_config::schema::SignalingConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::signaling::SignalEvent;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum MessageType {
    Open,
    Error,
    IdTaken,
    InvalidKey,
    Leave,
    Expire,
    Offer,
    Answer,
    Candidate,
    Heartbeat,
    #[serde(other)]
    Unknown,
}

/// A message pushed by the server over the socket.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
    #[serde(default)]
    pub src: Option<String>,
}

impl ServerMessage {
    /// `payload.msg`, when the server sent one.
    pub fn message(&self) -> Option<&str> {
        self.payload.as_ref()?.get("msg")?.as_str()
    }
}

/// A message sent by the client.
#[derive(Debug, Clone, Serialize)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub kind: MessageType,
}

impl ClientMessage {
    pub fn heartbeat() -> Self {
        Self {
            kind: MessageType::Heartbeat,
        }
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Translate a server message into the registration-level event it means
/// for peer `id`. Negotiation traffic (offer/answer/candidate) and peer
/// departures have no registration-level meaning and yield `None`.
pub fn event_for(msg: &ServerMessage, id: &PeerId, key: &str) -> Option<SignalEvent> {
    let error = |kind: SignalingErrorKind, fallback: String| SignalEvent::Error {
        kind,
        message: msg.message().map(str::to_string).unwrap_or(fallback),
    };

    match msg.kind {
        MessageType::Open => Some(SignalEvent::Open { id: id.clone() }),
        MessageType::IdTaken => Some(error(
            SignalingErrorKind::UnavailableId,
            format!("ID \"{id}\" is taken"),
        )),
        MessageType::InvalidKey => Some(error(
            SignalingErrorKind::InvalidKey,
            format!("API KEY \"{key}\" is invalid"),
        )),
        MessageType::Error => Some(error(
            SignalingErrorKind::ServerError,
            "Server reported an error".to_string(),
        )),
        MessageType::Expire => Some(SignalEvent::Error {
            kind: SignalingErrorKind::PeerUnavailable,
            message: format!(
                "Could not connect to peer {}",
                msg.src.as_deref().unwrap_or("unknown")
            ),
        }),
        MessageType::Leave
        | MessageType::Offer
        | MessageType::Answer
        | MessageType::Candidate
        | MessageType::Heartbeat
        | MessageType::Unknown => None,
    }
}

// ---------------------------------------------------------------------------
// URL
// ---------------------------------------------------------------------------

/// `ws[s]://host:port{path}peerjs?key=K&id=ID&token=T`
pub fn ws_url(config: &SignalingConfig, id: &PeerId, token: &str) -> Result<Url, ConfigError> {
    let scheme = if config.secure { "wss" } else { "ws" };
    let mut url = Url::parse(&format!(
        "{scheme}://{}:{}{}peerjs",
        config.host,
        config.port,
        config.normalized_path()
    ))
    .map_err(|e| ConfigError::ValidationError(format!("signaling endpoint: {e}")))?;
    url.query_pairs_mut()
        .append_pair("key", &config.key)
        .append_pair("id", id.as_str())
        .append_pair("token", token);
    Ok(url)
}
