use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),

    /// The viewer was launched without a sender identity to watch.
    #[error("missing target sender id (expected `?{param}=<id>`)")]
    MissingTarget { param: String },
}

/// Error type codes reported by the signaling service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalingErrorKind {
    BrowserIncompatible,
    Disconnected,
    InvalidId,
    InvalidKey,
    Network,
    PeerUnavailable,
    SslUnavailable,
    ServerError,
    SocketError,
    SocketClosed,
    UnavailableId,
    Webrtc,
}

impl SignalingErrorKind {
    pub const ALL: [SignalingErrorKind; 12] = [
        Self::BrowserIncompatible,
        Self::Disconnected,
        Self::InvalidId,
        Self::InvalidKey,
        Self::Network,
        Self::PeerUnavailable,
        Self::SslUnavailable,
        Self::ServerError,
        Self::SocketError,
        Self::SocketClosed,
        Self::UnavailableId,
        Self::Webrtc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BrowserIncompatible => "browser-incompatible",
            Self::Disconnected => "disconnected",
            Self::InvalidId => "invalid-id",
            Self::InvalidKey => "invalid-key",
            Self::Network => "network",
            Self::PeerUnavailable => "peer-unavailable",
            Self::SslUnavailable => "ssl-unavailable",
            Self::ServerError => "server-error",
            Self::SocketError => "socket-error",
            Self::SocketClosed => "socket-closed",
            Self::UnavailableId => "unavailable-id",
            Self::Webrtc => "webrtc",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == code)
    }

    /// Whether the registration is gone after this error. Non-fatal kinds
    /// concern a single connection attempt or a transient transport drop.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::Disconnected | Self::Network | Self::PeerUnavailable | Self::Webrtc
        )
    }
}

impl fmt::Display for SignalingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step of a session that can time out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Registration,
    Handshake,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registration => f.write_str("signaling registration"),
            Self::Handshake => f.write_str("media handshake"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("screen capture unavailable: {0}")]
    MediaAccess(String),

    #[error("signaling error ({kind}): {message}")]
    Signaling {
        kind: SignalingErrorKind,
        message: String,
    },

    #[error("call error: {0}")]
    Call(String),

    #[error("playback error: {0}")]
    Playback(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("timed out waiting for {stage}")]
    Timeout { stage: Stage },
}

impl SessionError {
    pub fn signaling(kind: SignalingErrorKind, message: impl Into<String>) -> Self {
        Self::Signaling {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScreenbeamError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ValidationError("capture.frame_rate".into());
        assert_eq!(err.to_string(), "config validation error: capture.frame_rate");

        let err = ConfigError::MissingTarget {
            param: "view".into(),
        };
        assert_eq!(
            err.to_string(),
            "missing target sender id (expected `?view=<id>`)"
        );
    }

    #[test]
    fn signaling_kind_codes_round_trip() {
        for kind in SignalingErrorKind::ALL {
            assert_eq!(SignalingErrorKind::from_code(kind.as_str()), Some(kind));
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert_eq!(SignalingErrorKind::from_code("nope"), None);
    }

    #[test]
    fn transient_kinds_are_not_fatal() {
        assert!(!SignalingErrorKind::PeerUnavailable.is_fatal());
        assert!(!SignalingErrorKind::Network.is_fatal());
        assert!(SignalingErrorKind::UnavailableId.is_fatal());
        assert!(SignalingErrorKind::InvalidKey.is_fatal());
    }

    #[test]
    fn session_error_display() {
        let err = SessionError::signaling(SignalingErrorKind::UnavailableId, "ID is taken");
        assert_eq!(
            err.to_string(),
            "signaling error (unavailable-id): ID is taken"
        );

        let err = SessionError::Timeout {
            stage: Stage::Registration,
        };
        assert_eq!(err.to_string(), "timed out waiting for signaling registration");
    }

    #[test]
    fn screenbeam_error_from_config() {
        let err: ScreenbeamError = ConfigError::ParseError("bad toml".into()).into();
        assert!(matches!(err, ScreenbeamError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn session_error_from_config() {
        let err: SessionError = ConfigError::MissingTarget {
            param: "view".into(),
        }
        .into();
        assert!(matches!(err, SessionError::Config(_)));
    }
}
