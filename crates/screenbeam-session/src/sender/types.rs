//! States, commands and options for the sender role.

use std::fmt;
use std::time::Duration;

use screenbeam_common::PeerId;
use screenbeam_config::schema::ShareConfig;
use screenbeam_config::ScreenbeamConfig;

use crate::media::CaptureConstraints;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    /// Nothing captured, nothing registered. Also where Stop lands.
    Idle,
    /// Waiting on the capture permission prompt.
    AcquiringMedia,
    /// Stream in hand, waiting for the signaling service to open.
    Registering,
    /// Identity is live and shareable; no viewers yet.
    Ready,
    /// At least one viewer is connected.
    Connected,
    /// Registration lost; Start again to recover.
    Error,
}

impl SenderState {
    /// Whether inbound viewer handshakes are accepted.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Ready | Self::Connected)
    }
}

impl fmt::Display for SenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::AcquiringMedia => "requesting-media",
            Self::Registering => "registering",
            Self::Ready => "ready",
            Self::Connected => "connected",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// User actions fed to [`super::SenderSession::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderCommand {
    Start,
    Stop,
    /// Stop and leave the run loop.
    Shutdown,
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SenderOptions {
    pub constraints: CaptureConstraints,
    pub share: ShareConfig,
    pub registration_timeout: Duration,
    /// How long an accepted data channel may stay silent before the viewer
    /// identity arrives.
    pub handshake_timeout: Duration,
    /// Register exactly this identity instead of generating one per Start.
    pub fixed_id: Option<PeerId>,
}

impl SenderOptions {
    pub fn from_config(config: &ScreenbeamConfig) -> Self {
        Self {
            constraints: CaptureConstraints::from(&config.capture),
            share: config.share.clone(),
            registration_timeout: config.timeouts.registration(),
            handshake_timeout: config.timeouts.handshake(),
            fixed_id: None,
        }
    }
}

impl Default for SenderOptions {
    fn default() -> Self {
        Self::from_config(&ScreenbeamConfig::default())
    }
}
