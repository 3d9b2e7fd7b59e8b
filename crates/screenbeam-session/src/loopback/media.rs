//! Synthetic capture sources and stream players.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use screenbeam_common::SessionError;
use tokio::sync::Notify;
use tracing::debug;

use crate::media::{
    CaptureConstraints, MediaCapture, MediaStream, MediaTrack, StreamPlayer, TrackHandle,
    TrackKind,
};

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// Capture source that grants or denies every request. Optionally gated so
/// a test can hold the permission prompt open.
pub struct SyntheticCapture {
    grant: bool,
    gate: Option<Arc<Notify>>,
    requests: AtomicUsize,
    last_constraints: Mutex<Option<CaptureConstraints>>,
    /// Live sources, keyed by the stream they feed.
    sources: Mutex<Vec<(String, TrackHandle)>>,
}

/// Releases one pending request of a gated [`SyntheticCapture`].
#[derive(Clone)]
pub struct CaptureGate {
    notify: Arc<Notify>,
}

impl CaptureGate {
    pub fn open(&self) {
        self.notify.notify_one();
    }
}

impl SyntheticCapture {
    fn with_mode(grant: bool, gate: Option<Arc<Notify>>) -> Self {
        Self {
            grant,
            gate,
            requests: AtomicUsize::new(0),
            last_constraints: Mutex::new(None),
            sources: Mutex::new(Vec::new()),
        }
    }

    pub fn granting() -> Self {
        Self::with_mode(true, None)
    }

    /// Every request fails as if the user dismissed the prompt.
    pub fn denying() -> Self {
        Self::with_mode(false, None)
    }

    /// Requests wait until the returned gate is opened, then succeed.
    pub fn gated() -> (Self, CaptureGate) {
        let notify = Arc::new(Notify::new());
        let gate = CaptureGate {
            notify: Arc::clone(&notify),
        };
        (Self::with_mode(true, Some(notify)), gate)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn last_constraints(&self) -> Option<CaptureConstraints> {
        self.last_constraints.lock().ok().and_then(|c| *c)
    }

    /// Streams handed out and not yet released.
    pub fn live_streams(&self) -> usize {
        self.sources
            .lock()
            .map(|s| s.iter().filter(|(_, handle)| handle.is_live()).count())
            .unwrap_or(0)
    }

    /// End every source, as when the user stops sharing from the OS.
    pub fn end_all(&self) {
        if let Ok(sources) = self.sources.lock() {
            for (_, handle) in sources.iter() {
                handle.stop();
            }
        }
    }
}

#[async_trait]
impl MediaCapture for SyntheticCapture {
    async fn capture(&self, constraints: CaptureConstraints) -> Result<MediaStream, SessionError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_constraints.lock() {
            *last = Some(constraints);
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if !self.grant {
            return Err(SessionError::MediaAccess("Permission denied".into()));
        }

        let (track, handle) = MediaTrack::new(TrackKind::Video, "synthetic screen");
        let stream = MediaStream::new(vec![track]);
        if let Ok(mut sources) = self.sources.lock() {
            sources.push((stream.id().to_string(), handle));
        }
        debug!(stream = %stream.id(), fps = constraints.frame_rate, "Synthetic capture granted");
        Ok(stream)
    }

    fn release(&self, stream: &MediaStream) {
        if let Ok(mut sources) = self.sources.lock() {
            sources.retain(|(id, handle)| {
                if id == stream.id() {
                    handle.stop();
                    false
                } else {
                    true
                }
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// Stream player that accepts or rejects every stream.
pub struct SyntheticPlayer {
    reject: Option<String>,
    played: AtomicUsize,
}

impl SyntheticPlayer {
    pub fn accepting() -> Self {
        Self {
            reject: None,
            played: AtomicUsize::new(0),
        }
    }

    /// Every play attempt fails with `reason`, as under an autoplay policy.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            reject: Some(reason.into()),
            played: AtomicUsize::new(0),
        }
    }

    /// Streams rendered successfully.
    pub fn played(&self) -> usize {
        self.played.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamPlayer for SyntheticPlayer {
    async fn play(&self, stream: MediaStream) -> Result<(), SessionError> {
        if let Some(reason) = &self.reject {
            return Err(SessionError::Playback(reason.clone()));
        }
        self.played.fetch_add(1, Ordering::SeqCst);
        debug!(stream = %stream.id(), "Synthetic playback started");
        Ok(())
    }
}
