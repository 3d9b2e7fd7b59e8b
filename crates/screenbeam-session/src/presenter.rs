//! Presentation collaborator: where sessions report what the user sees.

use std::sync::{Arc, Mutex};

use screenbeam_common::Status;

use crate::share::ShareLink;

/// Show/hide toggles a session drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    SenderView,
    ViewerView,
    StartButton,
    StopButton,
    /// Share link and its scannable code.
    SharePanel,
    ReconnectButton,
}

/// Receives plain display values from a session. Implementations must not
/// call back into the session.
pub trait Presenter: Send {
    fn show_status(&mut self, status: Status);
    fn clear_status(&mut self);
    fn show_share_link(&mut self, link: &ShareLink);
    fn clear_share_link(&mut self);
    fn show_viewer_count(&mut self, count: usize);
    fn set_visible(&mut self, control: Control, visible: bool);
}

// ---------------------------------------------------------------------------
// Recording presenter
// ---------------------------------------------------------------------------

/// One call made on a [`Presenter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    Status(Status),
    StatusCleared,
    ShareLink(String),
    ShareLinkCleared,
    ViewerCount(usize),
    Visible(Control, bool),
}

/// A presenter that only records what it is told. Read it back through the
/// [`PresenterLog`] returned alongside it.
pub struct RecordingPresenter {
    log: PresenterLog,
}

/// Shared read side of a [`RecordingPresenter`].
#[derive(Clone, Default)]
pub struct PresenterLog {
    events: Arc<Mutex<Vec<PresenterEvent>>>,
}

impl RecordingPresenter {
    pub fn new() -> (Self, PresenterLog) {
        let log = PresenterLog::default();
        (Self { log: log.clone() }, log)
    }

    fn record(&self, event: PresenterEvent) {
        if let Ok(mut events) = self.log.events.lock() {
            events.push(event);
        }
    }
}

impl Presenter for RecordingPresenter {
    fn show_status(&mut self, status: Status) {
        self.record(PresenterEvent::Status(status));
    }

    fn clear_status(&mut self) {
        self.record(PresenterEvent::StatusCleared);
    }

    fn show_share_link(&mut self, link: &ShareLink) {
        self.record(PresenterEvent::ShareLink(link.as_str().to_string()));
    }

    fn clear_share_link(&mut self) {
        self.record(PresenterEvent::ShareLinkCleared);
    }

    fn show_viewer_count(&mut self, count: usize) {
        self.record(PresenterEvent::ViewerCount(count));
    }

    fn set_visible(&mut self, control: Control, visible: bool) {
        self.record(PresenterEvent::Visible(control, visible));
    }
}

impl PresenterLog {
    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// The status currently on screen, if any.
    pub fn status(&self) -> Option<Status> {
        self.events().into_iter().rev().find_map(|e| match e {
            PresenterEvent::Status(s) => Some(Some(s)),
            PresenterEvent::StatusCleared => Some(None),
            _ => None,
        })?
    }

    /// The share link currently on screen, if any.
    pub fn share_link(&self) -> Option<String> {
        self.events().into_iter().rev().find_map(|e| match e {
            PresenterEvent::ShareLink(l) => Some(Some(l)),
            PresenterEvent::ShareLinkCleared => Some(None),
            _ => None,
        })?
    }

    /// The last viewer count shown.
    pub fn viewer_count(&self) -> Option<usize> {
        self.events().into_iter().rev().find_map(|e| match e {
            PresenterEvent::ViewerCount(n) => Some(n),
            _ => None,
        })
    }

    /// Every viewer count shown, in order.
    pub fn viewer_counts(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PresenterEvent::ViewerCount(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    /// Last visibility set for `control`; `None` if never touched.
    pub fn is_visible(&self, control: Control) -> Option<bool> {
        self.events().into_iter().rev().find_map(|e| match e {
            PresenterEvent::Visible(c, v) if c == control => Some(v),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_tracks_latest_values() {
        let (mut presenter, log) = RecordingPresenter::new();
        assert_eq!(log.status(), None);

        presenter.show_status(Status::info("one"));
        presenter.show_status(Status::success("two"));
        assert_eq!(log.status(), Some(Status::success("two")));

        presenter.clear_status();
        assert_eq!(log.status(), None);

        presenter.show_viewer_count(2);
        presenter.show_viewer_count(1);
        assert_eq!(log.viewer_count(), Some(1));
        assert_eq!(log.viewer_counts(), vec![2, 1]);

        presenter.set_visible(Control::StopButton, true);
        presenter.set_visible(Control::StartButton, false);
        assert_eq!(log.is_visible(Control::StopButton), Some(true));
        assert_eq!(log.is_visible(Control::StartButton), Some(false));
        assert_eq!(log.is_visible(Control::ReconnectButton), None);
    }
}
