//! Signaling service connection settings.

use serde::{Deserialize, Serialize};

/// Where and how to reach the PeerJS-compatible signaling server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalingConfig {
    pub host: String,
    pub port: u32,
    /// Server mount path; always normalized to start and end with `/`.
    pub path: String,
    /// Use `wss://` instead of `ws://`.
    pub secure: bool,
    /// API key the server was started with.
    pub key: String,
    pub heartbeat_interval_ms: u32,
    pub connect_timeout_secs: u32,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            host: "0.peerjs.com".into(),
            port: 443,
            path: "/".into(),
            secure: true,
            key: "peerjs".into(),
            heartbeat_interval_ms: 5000,
            connect_timeout_secs: 15,
        }
    }
}

impl SignalingConfig {
    /// The mount path with exactly one leading and one trailing slash.
    pub fn normalized_path(&self) -> String {
        let trimmed = self.path.trim_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{trimmed}/")
        }
    }
}
