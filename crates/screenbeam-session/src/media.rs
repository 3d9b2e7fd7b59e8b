//! Media streams and the capture/playback collaborators.

use async_trait::async_trait;
use screenbeam_common::{new_id, SessionError};
use screenbeam_config::schema::{CaptureConfig, CursorMode, DisplaySurface};
use tokio::sync::watch;

// ---------------------------------------------------------------------------
// Tracks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
}

/// Consumer side of a media track. Cheap to clone; all clones observe the
/// same liveness.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    id: String,
    kind: TrackKind,
    label: String,
    live: watch::Receiver<bool>,
}

/// Producer side of a media track, held by whoever owns the source.
/// Dropping it ends the track.
#[derive(Debug)]
pub struct TrackHandle {
    live: watch::Sender<bool>,
}

impl MediaTrack {
    /// Create a live track and the handle that controls it.
    pub fn new(kind: TrackKind, label: impl Into<String>) -> (Self, TrackHandle) {
        let (tx, rx) = watch::channel(true);
        let track = Self {
            id: new_id(),
            kind,
            label: label.into(),
            live: rx,
        };
        (track, TrackHandle { live: tx })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_live(&self) -> bool {
        *self.live.borrow() && self.live.has_changed().is_ok()
    }

    /// Resolves once the track has ended.
    pub async fn ended(&self) {
        let mut rx = self.live.clone();
        while *rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl TrackHandle {
    pub fn stop(&self) {
        self.live.send_replace(false);
    }

    pub fn is_live(&self) -> bool {
        *self.live.borrow()
    }
}

// ---------------------------------------------------------------------------
// Streams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MediaStream {
    id: String,
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: new_id(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Video)
    }

    /// A stream is active while any of its tracks is live.
    pub fn is_active(&self) -> bool {
        self.tracks.iter().any(MediaTrack::is_live)
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// What a screen capture request asks for. Audio is never requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub frame_rate: u32,
    pub cursor: CursorMode,
    pub display_surface: DisplaySurface,
    pub audio: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self::from(&CaptureConfig::default())
    }
}

impl From<&CaptureConfig> for CaptureConstraints {
    fn from(config: &CaptureConfig) -> Self {
        Self {
            frame_rate: config.frame_rate,
            cursor: config.cursor,
            display_surface: config.display_surface,
            audio: false,
        }
    }
}

/// Screen/window capture source.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    /// Ask for a capture stream. May wait on a user permission prompt.
    /// Denial or lack of a source is `SessionError::MediaAccess`.
    async fn capture(&self, constraints: CaptureConstraints) -> Result<MediaStream, SessionError>;

    /// Stop every track of a stream obtained from [`MediaCapture::capture`].
    fn release(&self, stream: &MediaStream);
}

/// Renders a received stream. Rejection (e.g. autoplay policy) is
/// `SessionError::Playback`.
#[async_trait]
pub trait StreamPlayer: Send + Sync {
    async fn play(&self, stream: MediaStream) -> Result<(), SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn track_ends_when_stopped() {
        let (track, handle) = MediaTrack::new(TrackKind::Video, "screen");
        assert!(track.is_live());

        let waiter = {
            let track = track.clone();
            tokio::spawn(async move { track.ended().await })
        };
        handle.stop();
        waiter.await.unwrap();
        assert!(!track.is_live());
        assert!(!handle.is_live());
    }

    #[tokio::test]
    async fn track_ends_when_handle_dropped() {
        let (track, handle) = MediaTrack::new(TrackKind::Video, "screen");
        drop(handle);
        track.ended().await;
        assert!(!track.is_live());
    }

    #[test]
    fn stream_activity_follows_tracks() {
        let (video, video_handle) = MediaTrack::new(TrackKind::Video, "screen");
        let (audio, audio_handle) = MediaTrack::new(TrackKind::Audio, "mic");
        let stream = MediaStream::new(vec![video, audio]);
        assert_eq!(stream.video_tracks().count(), 1);
        assert!(stream.is_active());

        video_handle.stop();
        assert!(stream.is_active());
        audio_handle.stop();
        assert!(!stream.is_active());
    }

    #[test]
    fn constraints_from_config_never_ask_for_audio() {
        let mut config = CaptureConfig::default();
        config.frame_rate = 30;
        let constraints = CaptureConstraints::from(&config);
        assert_eq!(constraints.frame_rate, 30);
        assert_eq!(constraints.cursor, CursorMode::Always);
        assert_eq!(constraints.display_surface, DisplaySurface::Window);
        assert!(!constraints.audio);
    }
}
