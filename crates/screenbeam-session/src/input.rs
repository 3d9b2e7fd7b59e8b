//! Session input queue: every event a session reacts to, stamped with the
//! epoch of the registration or request that produced it.

use std::fmt;

use screenbeam_common::SessionError;
use tokio::sync::mpsc;

use crate::media::MediaStream;
use crate::signaling::{CallId, ChannelId, SignalEvent};

// ---------------------------------------------------------------------------
// Epoch
// ---------------------------------------------------------------------------

/// Generation counter of a session. Advanced by every Start, Stop and
/// Reconnect; inputs stamped with an older epoch are stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Bounded waits armed by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Deadline {
    /// Registration sent, `open` not yet received.
    Registration,
    /// Viewer announced itself, stream not yet rendering.
    Handshake,
    /// Sender accepted a data channel, viewer identity not yet received.
    ViewerHandshake(ChannelId),
}

/// Everything that can wake a session up.
#[derive(Debug)]
pub enum SessionInput {
    Signal(SignalEvent),
    /// Screen capture request finished.
    MediaReady(Result<MediaStream, SessionError>),
    /// The captured video track ended outside our control.
    TrackEnded,
    /// Rendering of an answered call's stream finished.
    PlaybackFinished {
        call: CallId,
        result: Result<(), SessionError>,
    },
    DeadlineElapsed { deadline: Deadline, token: u64 },
}

#[derive(Debug)]
pub struct Stamped {
    pub epoch: Epoch,
    pub input: SessionInput,
}

pub type InputSender = mpsc::UnboundedSender<Stamped>;
pub type InputReceiver = mpsc::UnboundedReceiver<Stamped>;

// ---------------------------------------------------------------------------
// Signal sink
// ---------------------------------------------------------------------------

/// Handed to the signaling collaborator on `register`; every event it emits
/// for that registration goes through here.
#[derive(Debug, Clone)]
pub struct SignalSink {
    epoch: Epoch,
    tx: InputSender,
}

impl SignalSink {
    pub(crate) fn new(epoch: Epoch, tx: InputSender) -> Self {
        Self { epoch, tx }
    }

    /// A sink not attached to any session, for driving a signaling link
    /// directly.
    pub fn detached() -> (Self, InputReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(Epoch::default(), tx), rx)
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Deliver an event. Returns `false` once the session is gone.
    pub fn emit(&self, event: SignalEvent) -> bool {
        self.tx
            .send(Stamped {
                epoch: self.epoch,
                input: SessionInput::Signal(event),
            })
            .is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
