//! States, commands and options for the viewer role.

use std::fmt;
use std::time::Duration;

use screenbeam_common::PeerId;
use screenbeam_config::ScreenbeamConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerState {
    Idle,
    /// Registering, then opening the data channel to the sender.
    Connecting,
    /// Identity sent; waiting for the sender's call to start rendering.
    AwaitingCall,
    Connected,
    /// Transport dropped; the signaling service is reconnecting.
    Reconnecting,
    /// Reconnect control is shown.
    Error,
}

impl fmt::Display for ViewerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::AwaitingCall => "awaiting-call",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// User actions fed to [`super::ViewerSession::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerCommand {
    Connect,
    /// Tear down and connect again under a fresh identity.
    Reconnect,
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct ViewerOptions {
    /// Sender to watch, as read from the entry parameters.
    pub target: Option<PeerId>,
    /// Entry parameter the target is read from; named in the error when it
    /// is absent.
    pub query_param: String,
    pub registration_timeout: Duration,
    /// Identity sent until the stream is rendering.
    pub handshake_timeout: Duration,
}

impl ViewerOptions {
    pub fn from_config(config: &ScreenbeamConfig, target: Option<PeerId>) -> Self {
        Self {
            target,
            query_param: config.share.query_param.clone(),
            registration_timeout: config.timeouts.registration(),
            handshake_timeout: config.timeouts.handshake(),
        }
    }

    pub fn with_target(target: impl Into<PeerId>) -> Self {
        Self::from_config(&ScreenbeamConfig::default(), Some(target.into()))
    }
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self::from_config(&ScreenbeamConfig::default(), None)
    }
}
