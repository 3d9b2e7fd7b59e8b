//! Viewer session state machine.

use std::sync::Arc;

use screenbeam_common::{ConfigError, PeerId, SessionError, Stage, Status};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::input::{Deadline, Epoch, InputReceiver, InputSender, SessionInput, SignalSink, Stamped};
use crate::media::{MediaStream, StreamPlayer};
use crate::presenter::{Control, Presenter};
use crate::signaling::{CallId, ChannelId, SignalEvent, Signaling};
use crate::timers::Timers;

use super::types::{ViewerCommand, ViewerOptions, ViewerState};

const STATUS_CONNECTING: &str = "Connecting to screen share...";
const STATUS_VIEWING: &str = "Connected - Viewing screen";
const STATUS_RECONNECTING: &str = "Disconnected - trying to reconnect...";

// ---------------------------------------------------------------------------
// Viewer Session
// ---------------------------------------------------------------------------

pub struct ViewerSession {
    options: ViewerOptions,
    state: ViewerState,
    epoch: Epoch,
    signaling: Box<dyn Signaling>,
    player: Arc<dyn StreamPlayer>,
    presenter: Box<dyn Presenter>,
    own_id: Option<PeerId>,
    /// Data channel to the sender.
    channel: Option<ChannelId>,
    /// Answered call; only this one may drive rendering.
    call: Option<CallId>,
    stream: Option<MediaStream>,
    /// State to return to once a dropped transport reopens.
    resume: Option<ViewerState>,
    timers: Timers,
    tx: InputSender,
    rx: InputReceiver,
}

impl ViewerSession {
    pub fn new(
        options: ViewerOptions,
        signaling: Box<dyn Signaling>,
        player: Arc<dyn StreamPlayer>,
        mut presenter: Box<dyn Presenter>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        presenter.set_visible(Control::SenderView, false);
        presenter.set_visible(Control::ViewerView, true);
        presenter.set_visible(Control::ReconnectButton, false);

        Self {
            options,
            state: ViewerState::Idle,
            epoch: Epoch::default(),
            signaling,
            player,
            presenter,
            own_id: None,
            channel: None,
            call: None,
            stream: None,
            resume: None,
            timers: Timers::new(tx.clone()),
            tx,
            rx,
        }
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn own_id(&self) -> Option<&PeerId> {
        self.own_id.as_ref()
    }

    pub fn target(&self) -> Option<&PeerId> {
        self.options.target.as_ref()
    }

    pub fn call(&self) -> Option<CallId> {
        self.call
    }

    /// The stream being rendered, once the call delivered one.
    pub fn stream(&self) -> Option<&MediaStream> {
        self.stream.as_ref()
    }

    // -- commands -----------------------------------------------------------

    /// Register a fresh anonymous identity and connect to the target sender.
    pub fn connect(&mut self) {
        let Some(target) = self.options.target.clone() else {
            let error = SessionError::from(ConfigError::MissingTarget {
                param: self.options.query_param.clone(),
            });
            warn!(error = %error, "Viewer has no sender to connect to");
            self.reset();
            self.set_state(ViewerState::Error);
            self.presenter
                .show_status(Status::warning(format!("Configuration error: {error}")));
            self.presenter.set_visible(Control::ReconnectButton, false);
            return;
        };

        self.reset();
        self.set_state(ViewerState::Connecting);
        self.presenter.show_status(Status::info(STATUS_CONNECTING));
        self.presenter.set_visible(Control::ReconnectButton, false);
        info!(target = %target, epoch = %self.epoch, "Connecting to screen share");

        let sink = SignalSink::new(self.epoch, self.tx.clone());
        match self.signaling.register(None, sink) {
            Ok(()) => self.timers.arm(
                self.epoch,
                Deadline::Registration,
                self.options.registration_timeout,
            ),
            Err(e) => self.fail_with(&e),
        }
    }

    /// Drop the current registration and run the connect sequence again;
    /// the service assigns a new identity.
    pub fn reconnect(&mut self) {
        info!(previous = ?self.own_id, "Manual reconnect");
        self.connect();
    }

    /// Release everything and go back to `Idle`.
    pub fn shutdown(&mut self) {
        self.reset();
        self.set_state(ViewerState::Idle);
        self.presenter.clear_status();
        self.presenter.set_visible(Control::ReconnectButton, false);
    }

    // -- input loop ---------------------------------------------------------

    pub async fn run(mut self, mut commands: mpsc::Receiver<ViewerCommand>) {
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(ViewerCommand::Connect) => self.connect(),
                    Some(ViewerCommand::Reconnect) => self.reconnect(),
                    Some(ViewerCommand::Shutdown) | None => {
                        self.shutdown();
                        break;
                    }
                },
                Some(stamped) = self.rx.recv() => self.handle(stamped),
            }
        }
        debug!("Viewer session loop exited");
    }

    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(stamped) = self.rx.try_recv() {
            self.handle(stamped);
            handled += 1;
        }
        handled
    }

    pub async fn settle(&mut self) {
        let mut quiet = 0;
        while quiet < 3 {
            tokio::task::yield_now().await;
            if self.drain() == 0 {
                quiet += 1;
            } else {
                quiet = 0;
            }
        }
    }

    pub fn handle(&mut self, stamped: Stamped) {
        if stamped.epoch != self.epoch {
            debug!(stale = %stamped.epoch, current = %self.epoch, "Discarding stale input");
            return;
        }

        match stamped.input {
            SessionInput::Signal(event) => self.on_signal(event),
            SessionInput::PlaybackFinished { call, result } => self.on_playback(call, result),
            SessionInput::DeadlineElapsed { deadline, token } => self.on_deadline(deadline, token),
            SessionInput::MediaReady(_) | SessionInput::TrackEnded => {}
        }
    }

    // -- signaling ----------------------------------------------------------

    fn on_signal(&mut self, event: SignalEvent) {
        match event {
            SignalEvent::Open { id } => self.on_open(id),
            SignalEvent::Error { kind, message } => {
                warn!(kind = %kind, message = %message, "Peer error");
                let status = format!("Connection error: {kind}");
                if self.state == ViewerState::Connected && !kind.is_fatal() {
                    self.presenter.show_status(Status::warning(status));
                    self.presenter.set_visible(Control::ReconnectButton, true);
                } else {
                    self.fail(status);
                }
            }
            SignalEvent::Disconnected => self.on_disconnected(),
            SignalEvent::Connection { channel, peer } => {
                debug!(%channel, peer = %peer, "Viewer does not accept data channels");
                self.signaling.close_channel(channel);
            }
            SignalEvent::ChannelOpen { channel } => self.on_channel_open(channel),
            SignalEvent::ChannelData { channel, .. } => {
                debug!(%channel, "Ignoring data from sender");
            }
            SignalEvent::ChannelClose { channel } => {
                if self.channel != Some(channel) {
                    return;
                }
                self.channel = None;
                debug!(%channel, "Data channel to sender closed");
                if matches!(self.state, ViewerState::Connecting | ViewerState::AwaitingCall)
                    && self.call.is_none()
                {
                    self.fail("Error: Sender closed the connection".to_string());
                }
            }
            SignalEvent::IncomingCall { call, peer } => self.on_incoming_call(call, peer),
            SignalEvent::CallStream { call, stream } => self.on_call_stream(call, stream),
            SignalEvent::CallError { call, message } => {
                if self.call != Some(call) {
                    return;
                }
                warn!(%call, message = %message, "Call error");
                self.call = None;
                self.stream = None;
                self.fail(format!("Error: {message}"));
            }
            SignalEvent::CallClose { call } => {
                if self.call != Some(call) {
                    return;
                }
                info!(%call, "Sender ended the call");
                self.call = None;
                self.stream = None;
                if self.state != ViewerState::Error {
                    self.fail("Error: Stream ended by sender".to_string());
                }
            }
        }
    }

    fn on_open(&mut self, id: PeerId) {
        match self.state {
            ViewerState::Connecting => {
                self.timers.disarm(Deadline::Registration);
                info!(id = %id, "Viewer peer open");
                self.own_id = Some(id);
                self.open_channel();
            }
            ViewerState::Reconnecting => {
                self.timers.disarm(Deadline::Registration);
                info!(id = %id, "Signaling registration restored");
                self.own_id = Some(id);
                match self.resume.take() {
                    Some(ViewerState::Connected) if self.stream.is_some() => {
                        self.set_state(ViewerState::Connected);
                        self.presenter.show_status(Status::success(STATUS_VIEWING));
                    }
                    Some(ViewerState::AwaitingCall) if self.channel.is_some() => {
                        self.set_state(ViewerState::AwaitingCall);
                        self.presenter.show_status(Status::info(STATUS_CONNECTING));
                    }
                    _ => {
                        self.set_state(ViewerState::Connecting);
                        self.presenter.show_status(Status::info(STATUS_CONNECTING));
                        self.open_channel();
                    }
                }
            }
            other => debug!(state = %other, "Ignoring open"),
        }
    }

    fn open_channel(&mut self) {
        let Some(target) = self.options.target.clone() else {
            return;
        };
        if let Some(old) = self.channel.take() {
            self.signaling.close_channel(old);
        }
        match self.signaling.connect(&target) {
            Ok(channel) => {
                debug!(%channel, target = %target, "Opening data channel to sender");
                self.channel = Some(channel);
            }
            Err(e) => self.fail_with(&e),
        }
    }

    fn on_channel_open(&mut self, channel: ChannelId) {
        if self.channel != Some(channel) || self.state != ViewerState::Connecting {
            return;
        }
        let Some(own_id) = self.own_id.clone() else {
            return;
        };
        if let Err(e) = self.signaling.send(channel, own_id.as_str()) {
            self.fail_with(&e);
            return;
        }
        info!(id = %own_id, %channel, "Sent viewer ID to sender");
        self.set_state(ViewerState::AwaitingCall);
        self.timers.arm(
            self.epoch,
            Deadline::Handshake,
            self.options.handshake_timeout,
        );
    }

    fn on_incoming_call(&mut self, call: CallId, peer: PeerId) {
        if self.state == ViewerState::Idle {
            self.signaling.hang_up(call);
            return;
        }
        if self.options.target.as_ref() != Some(&peer) {
            warn!(peer = %peer, target = ?self.options.target, "Call from unexpected peer");
        }
        if let Some(old) = self.call.replace(call) {
            if old != call {
                self.signaling.hang_up(old);
            }
        }
        self.stream = None;

        info!(%call, peer = %peer, "Answering call");
        if let Err(e) = self.signaling.answer(call) {
            self.call = None;
            self.fail(format!("Error: {e}"));
        }
    }

    fn on_call_stream(&mut self, call: CallId, stream: MediaStream) {
        if self.call != Some(call) {
            return;
        }
        debug!(%call, stream = %stream.id(), "Received remote stream");
        self.stream = Some(stream.clone());

        let player = Arc::clone(&self.player);
        let tx = self.tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let result = player.play(stream).await;
            let _ = tx.send(Stamped {
                epoch,
                input: SessionInput::PlaybackFinished { call, result },
            });
        });
    }

    fn on_playback(&mut self, call: CallId, result: Result<(), SessionError>) {
        if self.call != Some(call) {
            return;
        }
        match result {
            Ok(()) => {
                self.timers.disarm(Deadline::Handshake);
                info!(%call, "Viewing screen");
                self.set_state(ViewerState::Connected);
                self.presenter.show_status(Status::success(STATUS_VIEWING));
                self.presenter.set_visible(Control::ReconnectButton, false);
            }
            Err(e) => {
                warn!(%call, error = %e, "Error playing video");
                let reason = match e {
                    SessionError::Playback(reason) => reason,
                    other => other.to_string(),
                };
                self.fail(format!("Error playing video: {reason}"));
            }
        }
    }

    fn on_disconnected(&mut self) {
        match self.state {
            ViewerState::Idle | ViewerState::Error => return,
            ViewerState::Reconnecting => {}
            other => self.resume = Some(other),
        }
        warn!("Signaling transport dropped, reconnecting");
        self.set_state(ViewerState::Reconnecting);
        self.presenter.show_status(Status::warning(STATUS_RECONNECTING));

        match self.signaling.reconnect() {
            Ok(()) => self.timers.arm(
                self.epoch,
                Deadline::Registration,
                self.options.registration_timeout,
            ),
            Err(e) => self.fail_with(&e),
        }
    }

    // -- deadlines ----------------------------------------------------------

    fn on_deadline(&mut self, deadline: Deadline, token: u64) {
        if !self.timers.expire(deadline, token) {
            return;
        }
        let stage = match (deadline, self.state) {
            (Deadline::Registration, ViewerState::Connecting | ViewerState::Reconnecting) => {
                Stage::Registration
            }
            (Deadline::Handshake, ViewerState::AwaitingCall) => Stage::Handshake,
            _ => return,
        };
        self.fail_with(&SessionError::Timeout { stage });
    }

    // -- helpers ------------------------------------------------------------

    fn set_state(&mut self, state: ViewerState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "Viewer state");
            self.state = state;
        }
    }

    /// Drop the registration and everything on it, and start a new epoch.
    fn reset(&mut self) {
        self.timers.clear();
        self.signaling.destroy();
        self.own_id = None;
        self.channel = None;
        self.call = None;
        self.stream = None;
        self.resume = None;
        self.epoch = self.epoch.next();
    }

    fn fail_with(&mut self, error: &SessionError) {
        let status = match error {
            SessionError::Signaling { kind, .. } => format!("Connection error: {kind}"),
            SessionError::Timeout { stage } => format!("Timed out waiting for {stage}"),
            SessionError::Playback(reason) => format!("Error playing video: {reason}"),
            other => format!("Error: {other}"),
        };
        self.fail(status);
    }

    /// Show `status` with the reconnect control and wait for the user.
    fn fail(&mut self, status: String) {
        warn!(state = %self.state, status = %status, "Viewer session failed");
        self.timers.clear();
        self.resume = None;
        self.set_state(ViewerState::Error);
        self.presenter.show_status(Status::warning(status));
        self.presenter.set_visible(Control::ReconnectButton, true);
    }
}
