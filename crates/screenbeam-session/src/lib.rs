//! Peer-session state machines for one-to-many screen broadcasting.
//!
//! A [`SenderSession`] captures the screen, registers a shareable identity
//! with the signaling service and calls every viewer that announces itself
//! over a data channel. A [`ViewerSession`] registers anonymously, announces
//! itself to a known sender and renders the stream it is called with.
//!
//! Both sessions are single-owner state machines fed by one input queue.
//! Every input is stamped with the epoch it belongs to so completions that
//! outlive a Stop or Reconnect are discarded.

pub mod input;
pub mod loopback;
pub mod media;
pub mod peerjs;
pub mod presenter;
pub mod sender;
pub mod share;
pub mod signaling;
pub mod viewer;

mod timers;

pub use input::{Deadline, Epoch, InputReceiver, InputSender, SessionInput, SignalSink, Stamped};
pub use media::{
    CaptureConstraints, MediaCapture, MediaStream, MediaTrack, StreamPlayer, TrackHandle,
    TrackKind,
};
pub use presenter::{Control, PresenterEvent, PresenterLog, Presenter, RecordingPresenter};
pub use sender::{SenderCommand, SenderOptions, SenderSession, SenderState};
pub use share::{parse_target, ShareLink};
pub use signaling::{CallId, ChannelId, SignalEvent, Signaling};
pub use viewer::{ViewerCommand, ViewerOptions, ViewerSession, ViewerState};
