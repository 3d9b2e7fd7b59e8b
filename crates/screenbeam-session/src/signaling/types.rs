//! Handles and events exchanged with the signaling collaborator.

use std::fmt;

use screenbeam_common::{PeerId, SignalingErrorKind};

use crate::media::MediaStream;

/// Local handle of one end of a data channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u64);

/// Local handle of one end of a media call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dc-{}", self.0)
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mc-{}", self.0)
    }
}

/// Events emitted by the signaling collaborator.
#[derive(Debug)]
pub enum SignalEvent {
    // -- registration --
    /// Registration is live under `id`.
    Open { id: PeerId },
    Error {
        kind: SignalingErrorKind,
        message: String,
    },
    /// Transport to the service dropped; the identity may still be reclaimed
    /// with `reconnect`.
    Disconnected,

    // -- data channels --
    /// A remote peer opened a data channel to us.
    Connection { channel: ChannelId, peer: PeerId },
    ChannelOpen { channel: ChannelId },
    ChannelData { channel: ChannelId, payload: String },
    ChannelClose { channel: ChannelId },

    // -- calls --
    IncomingCall { call: CallId, peer: PeerId },
    CallStream { call: CallId, stream: MediaStream },
    CallError { call: CallId, message: String },
    CallClose { call: CallId },
}
