//! Presenter that writes session output to the terminal.

use screenbeam_common::{Status, StatusLevel};
use screenbeam_session::{Control, Presenter, ShareLink};
use tracing::debug;

use crate::qr::render_share_qr;

const RESET: &str = "\x1b[0m";

/// Prints what a session shows, one line per update, tagged with `label`
/// so several sessions can share one terminal.
pub struct TerminalPresenter {
    label: String,
    show_qr: bool,
}

impl TerminalPresenter {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            show_qr: true,
        }
    }

    /// Print the QR code under each share link (on by default).
    pub fn with_qr(mut self, show_qr: bool) -> Self {
        self.show_qr = show_qr;
        self
    }
}

fn color(level: StatusLevel) -> &'static str {
    match level {
        StatusLevel::Info => "\x1b[36m",
        StatusLevel::Success => "\x1b[32m",
        StatusLevel::Warning => "\x1b[33m",
    }
}

/// `[label] message`, colored by severity.
pub fn format_status(label: &str, status: &Status) -> String {
    format!("[{label}] {}{}{RESET}", color(status.level), status.message)
}

/// The share block: link line, then the QR code when requested.
pub fn format_share_link(label: &str, link: &ShareLink, show_qr: bool) -> String {
    let mut out = format!("[{label}] Share this link: {link}");
    if show_qr {
        if let Some(qr) = render_share_qr(link) {
            out.push('\n');
            out.push_str(&qr);
        }
    }
    out
}

impl Presenter for TerminalPresenter {
    fn show_status(&mut self, status: Status) {
        println!("{}", format_status(&self.label, &status));
    }

    fn clear_status(&mut self) {}

    fn show_share_link(&mut self, link: &ShareLink) {
        println!("{}", format_share_link(&self.label, link, self.show_qr));
    }

    fn clear_share_link(&mut self) {}

    fn show_viewer_count(&mut self, count: usize) {
        println!("[{}] Connected viewers: {count}", self.label);
    }

    fn set_visible(&mut self, control: Control, visible: bool) {
        debug!(label = %self.label, ?control, visible, "Control visibility");
    }
}
