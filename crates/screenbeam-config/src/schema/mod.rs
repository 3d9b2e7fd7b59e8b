//! Configuration schema types for screenbeam.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod capture;
mod logging;
mod share;
mod signaling;
mod timeouts;

pub use capture::*;
pub use logging::*;
pub use share::*;
pub use signaling::*;
pub use timeouts::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenbeamConfig {
    pub signaling: SignalingConfig,
    pub capture: CaptureConfig,
    pub share: ShareConfig,
    pub timeouts: TimeoutConfig,
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hosted_service() {
        let config = ScreenbeamConfig::default();
        assert_eq!(config.signaling.host, "0.peerjs.com");
        assert_eq!(config.signaling.port, 443);
        assert_eq!(config.signaling.key, "peerjs");
        assert_eq!(config.capture.frame_rate, 60);
        assert_eq!(config.capture.display_surface, DisplaySurface::Window);
        assert_eq!(config.share.query_param, "view");
        assert_eq!(config.share.id_prefix, "screen-");
    }

    #[test]
    fn normalized_path_variants() {
        let mut sig = SignalingConfig::default();
        assert_eq!(sig.normalized_path(), "/");
        sig.path = "myapp".into();
        assert_eq!(sig.normalized_path(), "/myapp/");
        sig.path = "/nested/app/".into();
        assert_eq!(sig.normalized_path(), "/nested/app/");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: ScreenbeamConfig = toml::from_str(
            r#"
[capture]
cursor = "never"
"#,
        )
        .unwrap();
        assert_eq!(config.capture.cursor, CursorMode::Never);
        assert_eq!(config.capture.frame_rate, 60);
        assert_eq!(config.timeouts.registration_secs, 15);
    }

    #[test]
    fn logging_directive() {
        let logging = LoggingConfig {
            level: "debug".into(),
        };
        assert_eq!(logging.directive(), "screenbeam=debug");
    }
}
