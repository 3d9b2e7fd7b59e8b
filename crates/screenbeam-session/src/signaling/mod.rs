//! Contract with the signaling collaborator.
//!
//! The collaborator allocates identities, brokers data-channel and call
//! handshakes and relays media. Commands are non-blocking; their outcomes
//! come back as [`SignalEvent`]s through the [`SignalSink`] given to
//! [`Signaling::register`].

mod types;

pub use types::{CallId, ChannelId, SignalEvent};

use screenbeam_common::{PeerId, SessionError};

use crate::input::SignalSink;
use crate::media::MediaStream;

pub trait Signaling: Send {
    /// Register with the service, asking for `id` or letting the service
    /// assign one. Emits `Open`, `Error` or `Disconnected` later. Replaces
    /// any previous registration.
    fn register(&mut self, id: Option<PeerId>, sink: SignalSink) -> Result<(), SessionError>;

    /// Open a data channel to `target`.
    fn connect(&mut self, target: &PeerId) -> Result<ChannelId, SessionError>;

    fn send(&mut self, channel: ChannelId, payload: &str) -> Result<(), SessionError>;

    fn close_channel(&mut self, channel: ChannelId);

    /// Start a one-way media call carrying `stream` to `target`.
    fn call(&mut self, target: &PeerId, stream: &MediaStream) -> Result<CallId, SessionError>;

    /// Answer an inbound call without sending media back.
    fn answer(&mut self, call: CallId) -> Result<(), SessionError>;

    fn hang_up(&mut self, call: CallId);

    /// Re-establish a dropped transport, keeping the current identity.
    fn reconnect(&mut self) -> Result<(), SessionError>;

    /// Tear down the registration and every channel and call on it.
    /// Safe to call when nothing is registered.
    fn destroy(&mut self);
}
