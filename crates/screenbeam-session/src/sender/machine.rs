//! Sender session state machine.

use std::sync::Arc;

use screenbeam_common::{generate_sender_id, PeerId, SessionError, Stage, Status};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::input::{Deadline, Epoch, InputReceiver, InputSender, SessionInput, SignalSink, Stamped};
use crate::media::{MediaCapture, MediaStream};
use crate::presenter::{Control, Presenter};
use crate::share::ShareLink;
use crate::signaling::{CallId, ChannelId, SignalEvent, Signaling};
use crate::timers::Timers;

use super::registry::{Admission, ViewerEntry, ViewerRegistry};
use super::types::{SenderCommand, SenderOptions, SenderState};

const STATUS_REQUESTING: &str = "Requesting screen access...";
const STATUS_READY: &str = "Ready to connect!";
const STATUS_CAPTURE_FAILED: &str = "Failed to start screen share. Please try again.";
const STATUS_RECONNECTING: &str = "Disconnected - trying to reconnect...";

// ---------------------------------------------------------------------------
// Sender Session
// ---------------------------------------------------------------------------

/// Owns everything the sender role holds: the captured stream, the
/// signaling registration and one registry entry per connected viewer.
pub struct SenderSession {
    options: SenderOptions,
    state: SenderState,
    epoch: Epoch,
    signaling: Box<dyn Signaling>,
    capture: Arc<dyn MediaCapture>,
    presenter: Box<dyn Presenter>,
    stream: Option<MediaStream>,
    own_id: Option<PeerId>,
    link: Option<ShareLink>,
    registry: ViewerRegistry,
    timers: Timers,
    tx: InputSender,
    rx: InputReceiver,
}

impl SenderSession {
    pub fn new(
        options: SenderOptions,
        signaling: Box<dyn Signaling>,
        capture: Arc<dyn MediaCapture>,
        mut presenter: Box<dyn Presenter>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        presenter.set_visible(Control::SenderView, true);
        presenter.set_visible(Control::ViewerView, false);
        presenter.set_visible(Control::StartButton, true);
        presenter.set_visible(Control::StopButton, false);
        presenter.set_visible(Control::SharePanel, false);

        Self {
            options,
            state: SenderState::Idle,
            epoch: Epoch::default(),
            signaling,
            capture,
            presenter,
            stream: None,
            own_id: None,
            link: None,
            registry: ViewerRegistry::default(),
            timers: Timers::new(tx.clone()),
            tx,
            rx,
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn state(&self) -> SenderState {
        self.state
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Identity registered with the signaling service, once open.
    pub fn own_id(&self) -> Option<&PeerId> {
        self.own_id.as_ref()
    }

    pub fn share_link(&self) -> Option<&ShareLink> {
        self.link.as_ref()
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    pub fn viewer_count(&self) -> usize {
        self.registry.len()
    }

    pub fn viewers(&self) -> Vec<PeerId> {
        self.registry.ids()
    }

    pub fn viewer_entries(&self) -> Vec<ViewerEntry> {
        self.registry.entries()
    }

    pub fn call_for(&self, viewer: &PeerId) -> Option<CallId> {
        self.registry.call_for(viewer)
    }

    // -- commands -----------------------------------------------------------

    /// Request a capture stream, then register a fresh identity. Ignored
    /// while a share is already starting or running.
    pub fn start(&mut self) {
        match self.state {
            SenderState::Idle => {}
            SenderState::Error => self.teardown(),
            other => {
                warn!(state = %other, "Start ignored, screen share already active");
                return;
            }
        }

        self.epoch = self.epoch.next();
        self.set_state(SenderState::AcquiringMedia);
        self.presenter.show_status(Status::info(STATUS_REQUESTING));

        let capture = Arc::clone(&self.capture);
        let constraints = self.options.constraints;
        let tx = self.tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let result = capture.capture(constraints).await;
            let _ = tx.send(Stamped {
                epoch,
                input: SessionInput::MediaReady(result),
            });
        });
    }

    /// Release the stream, drop the registration and every viewer, and
    /// return to `Idle`. Safe to call in any state, any number of times.
    pub fn stop(&mut self) {
        let was = self.state;
        self.teardown();
        self.set_state(SenderState::Idle);

        self.presenter.show_viewer_count(0);
        self.presenter.clear_share_link();
        self.presenter.clear_status();
        self.presenter.set_visible(Control::StartButton, true);
        self.presenter.set_visible(Control::StopButton, false);
        self.presenter.set_visible(Control::SharePanel, false);

        if was != SenderState::Idle {
            info!(epoch = %self.epoch, "Screen share stopped");
        }
    }

    // -- input loop ---------------------------------------------------------

    /// Drive the session from user commands and collaborator events until
    /// `Shutdown` or the command channel closes.
    pub async fn run(mut self, mut commands: mpsc::Receiver<SenderCommand>) {
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(SenderCommand::Start) => self.start(),
                    Some(SenderCommand::Stop) => self.stop(),
                    Some(SenderCommand::Shutdown) | None => {
                        self.stop();
                        break;
                    }
                },
                Some(stamped) = self.rx.recv() => self.handle(stamped),
            }
        }
        debug!("Sender session loop exited");
    }

    /// Handle every input already queued. Returns how many were handled.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(stamped) = self.rx.try_recv() {
            self.handle(stamped);
            handled += 1;
        }
        handled
    }

    /// Let spawned work (capture, playback) run and handle what it produces,
    /// until the queue stays empty for a few scheduler turns.
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
            if let SessionInput::MediaReady(Ok(stream)) = stamped.input {
                self.capture.release(&stream);
            }
            return;
        }

        match stamped.input {
            SessionInput::Signal(event) => self.on_signal(event),
            SessionInput::MediaReady(result) => self.on_media_ready(result),
            SessionInput::TrackEnded => {
                if self.state != SenderState::Idle {
                    info!("Capture track ended, stopping share");
                    self.stop();
                }
            }
            SessionInput::DeadlineElapsed { deadline, token } => self.on_deadline(deadline, token),
            SessionInput::PlaybackFinished { .. } => {}
        }
    }

    // -- media --------------------------------------------------------------

    fn on_media_ready(&mut self, result: Result<MediaStream, SessionError>) {
        if self.state != SenderState::AcquiringMedia {
            if let Ok(stream) = result {
                self.capture.release(&stream);
            }
            return;
        }

        let stream = match result {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Error starting screen share");
                self.set_state(SenderState::Idle);
                self.presenter.show_status(Status::warning(STATUS_CAPTURE_FAILED));
                return;
            }
        };

        self.watch_track_end(&stream);
        self.stream = Some(stream);

        let id = self
            .options
            .fixed_id
            .clone()
            .unwrap_or_else(|| generate_sender_id(&self.options.share.id_prefix));
        let sink = SignalSink::new(self.epoch, self.tx.clone());
        match self.signaling.register(Some(id.clone()), sink) {
            Ok(()) => {
                info!(id = %id, "Registering sender identity");
                self.set_state(SenderState::Registering);
                self.timers.arm(
                    self.epoch,
                    Deadline::Registration,
                    self.options.registration_timeout,
                );
            }
            Err(e) => self.fail(&e),
        }
    }

    fn watch_track_end(&self, stream: &MediaStream) {
        let Some(track) = stream.video_tracks().next().cloned() else {
            return;
        };
        let tx = self.tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            track.ended().await;
            let _ = tx.send(Stamped {
                epoch,
                input: SessionInput::TrackEnded,
            });
        });
    }

    // -- signaling ----------------------------------------------------------

    fn on_signal(&mut self, event: SignalEvent) {
        match event {
            SignalEvent::Open { id } => self.on_open(id),
            SignalEvent::Error { kind, message } => {
                warn!(kind = %kind, message = %message, "Peer error");
                if kind.is_fatal() && self.state != SenderState::Idle {
                    self.fail(&SessionError::signaling(kind, message));
                } else {
                    self.presenter
                        .show_status(Status::warning(format!("Error: {kind}")));
                }
            }
            SignalEvent::Disconnected => {
                if !matches!(self.state, SenderState::Registering) && !self.state.is_live() {
                    return;
                }
                warn!("Signaling transport dropped, reconnecting");
                self.presenter.show_status(Status::warning(STATUS_RECONNECTING));
                if let Err(e) = self.signaling.reconnect() {
                    self.fail(&e);
                }
            }
            SignalEvent::Connection { channel, peer } => {
                if !self.state.is_live() {
                    debug!(%channel, "Refusing data channel while not sharing");
                    self.signaling.close_channel(channel);
                    return;
                }
                debug!(%channel, peer = %peer, "Data connection received from viewer");
                self.registry.accept(channel, peer);
                self.timers.arm(
                    self.epoch,
                    Deadline::ViewerHandshake(channel),
                    self.options.handshake_timeout,
                );
            }
            SignalEvent::ChannelOpen { channel } => {
                debug!(%channel, "Viewer data channel open");
            }
            SignalEvent::ChannelData { channel, payload } => {
                self.on_viewer_identity(channel, &payload);
            }
            SignalEvent::ChannelClose { channel } => self.on_channel_close(channel),
            SignalEvent::IncomingCall { call, peer } => {
                debug!(%call, peer = %peer, "Sender does not accept calls");
                self.signaling.hang_up(call);
            }
            SignalEvent::CallStream { call, .. } => {
                debug!(%call, "Ignoring stream on sender");
            }
            SignalEvent::CallError { call, message } => {
                // Only this viewer's call is affected.
                if let Some(viewer) = self.registry.clear_call(call) {
                    warn!(viewer = %viewer, %call, message = %message, "Call error");
                    self.presenter
                        .show_status(Status::warning(format!("Error: {message}")));
                }
            }
            SignalEvent::CallClose { call } => {
                if let Some(viewer) = self.registry.clear_call(call) {
                    debug!(viewer = %viewer, %call, "Call closed");
                }
            }
        }
    }

    fn on_open(&mut self, id: PeerId) {
        match self.state {
            SenderState::Registering => {}
            SenderState::Ready | SenderState::Connected => {
                info!(id = %id, "Signaling registration restored");
                self.presenter.show_status(Status::success(STATUS_READY));
                return;
            }
            other => {
                debug!(state = %other, "Ignoring open outside registration");
                return;
            }
        }

        self.timers.disarm(Deadline::Registration);
        info!(id = %id, "Sender peer open");

        match ShareLink::build(&self.options.share, &id) {
            Ok(link) => {
                self.presenter.show_share_link(&link);
                self.link = Some(link);
            }
            Err(e) => warn!(error = %e, "Could not build viewer link"),
        }
        self.own_id = Some(id);
        self.set_state(SenderState::Ready);

        self.presenter.show_status(Status::success(STATUS_READY));
        self.presenter.set_visible(Control::StartButton, false);
        self.presenter.set_visible(Control::StopButton, true);
        self.presenter.set_visible(Control::SharePanel, true);
        self.presenter.show_viewer_count(self.registry.len());
    }

    fn on_viewer_identity(&mut self, channel: ChannelId, payload: &str) {
        if !self.state.is_live() {
            return;
        }
        if !self.registry.knows_channel(channel) {
            debug!(%channel, "Data on unknown channel");
            return;
        }
        let viewer = PeerId::new(payload.trim());
        if viewer.is_empty() {
            warn!(%channel, "Viewer sent an empty identity");
            return;
        }

        match self.registry.admit(channel, viewer.clone()) {
            Admission::Joined => {
                info!(viewer = %viewer, %channel, "Received viewer peer ID");
                self.refresh_count();
            }
            Admission::Repeated => {
                debug!(viewer = %viewer, %channel, "Repeated viewer handshake");
            }
            Admission::Conflict { bound_to } => {
                warn!(
                    viewer = %viewer,
                    %bound_to,
                    %channel,
                    "Ignoring second identity on an identified channel"
                );
                return;
            }
        }
        self.timers.disarm(Deadline::ViewerHandshake(channel));

        if self.registry.call_for(&viewer).is_none() {
            self.call_viewer(&viewer);
        }
    }

    fn call_viewer(&mut self, viewer: &PeerId) {
        let Some(stream) = self.stream.as_ref() else {
            return;
        };
        match self.signaling.call(viewer, stream) {
            Ok(call) => {
                info!(viewer = %viewer, %call, "Initiated call to viewer");
                self.registry.set_call(viewer, call);
            }
            Err(e) => {
                warn!(viewer = %viewer, error = %e, "Call error");
                self.presenter.show_status(Status::warning(format!("Error: {e}")));
            }
        }
    }

    fn on_channel_close(&mut self, channel: ChannelId) {
        self.timers.disarm(Deadline::ViewerHandshake(channel));
        let Some(entry) = self.registry.remove_channel(channel) else {
            return;
        };
        info!(viewer = %entry.viewer, %channel, "Data connection closed for viewer");
        if let Some(call) = entry.call {
            self.signaling.hang_up(call);
        }
        self.refresh_count();
    }

    // -- deadlines ----------------------------------------------------------

    fn on_deadline(&mut self, deadline: Deadline, token: u64) {
        if !self.timers.expire(deadline, token) {
            return;
        }
        match deadline {
            Deadline::Registration if self.state == SenderState::Registering => {
                warn!("Signaling registration timed out");
                self.fail(&SessionError::Timeout {
                    stage: Stage::Registration,
                });
            }
            Deadline::ViewerHandshake(channel) if self.registry.is_pending(channel) => {
                warn!(%channel, "Viewer never identified itself, closing channel");
                self.registry.remove_channel(channel);
                self.signaling.close_channel(channel);
            }
            _ => {}
        }
    }

    // -- helpers ------------------------------------------------------------

    fn set_state(&mut self, state: SenderState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "Sender state");
            self.state = state;
        }
    }

    fn refresh_count(&mut self) {
        let count = self.registry.len();
        self.presenter.show_viewer_count(count);
        match (self.state, count) {
            (SenderState::Ready, n) if n > 0 => self.set_state(SenderState::Connected),
            (SenderState::Connected, 0) => self.set_state(SenderState::Ready),
            _ => {}
        }
    }

    /// Release every resource and advance the epoch so in-flight
    /// completions of the old share are discarded.
    fn teardown(&mut self) {
        self.timers.clear();
        if let Some(stream) = self.stream.take() {
            self.capture.release(&stream);
        }
        let (entries, pending) = self.registry.drain();
        for entry in entries {
            if let Some(call) = entry.call {
                self.signaling.hang_up(call);
            }
            for channel in entry.channels {
                self.signaling.close_channel(channel);
            }
        }
        for channel in pending {
            self.signaling.close_channel(channel);
        }
        self.signaling.destroy();
        self.own_id = None;
        self.link = None;
        self.epoch = self.epoch.next();
    }

    /// Registration-level failure: tear down and wait for a new Start.
    fn fail(&mut self, error: &SessionError) {
        let message = match error {
            SessionError::Signaling { kind, .. } => format!("Error: {kind}"),
            SessionError::Timeout { stage } => format!("Timed out waiting for {stage}"),
            other => format!("Error: {other}"),
        };
        warn!(error = %error, "Screen share failed");

        self.teardown();
        self.set_state(SenderState::Error);
        self.presenter.show_status(Status::warning(message));
        self.presenter.show_viewer_count(0);
        self.presenter.clear_share_link();
        self.presenter.set_visible(Control::StartButton, true);
        self.presenter.set_visible(Control::StopButton, false);
        self.presenter.set_visible(Control::SharePanel, false);
    }
}
