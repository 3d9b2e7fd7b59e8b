//! Screen capture request settings.

use serde::{Deserialize, Serialize};

/// Whether the pointer is drawn into the captured video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorMode {
    #[default]
    Always,
    Motion,
    Never,
}

/// Which kind of surface the capture picker offers first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplaySurface {
    Monitor,
    #[default]
    Window,
    Browser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Target frame rate (1-120).
    pub frame_rate: u32,
    pub cursor: CursorMode,
    pub display_surface: DisplaySurface,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            cursor: CursorMode::Always,
            display_surface: DisplaySurface::Window,
        }
    }
}
