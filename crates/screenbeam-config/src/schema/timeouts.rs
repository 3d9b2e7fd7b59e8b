use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bounded waits for the asynchronous session steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Registration with the signaling service until `open`.
    pub registration_secs: u32,
    /// Data channel open until the media stream is flowing.
    pub handshake_secs: u32,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            registration_secs: 15,
            handshake_secs: 20,
        }
    }
}

impl TimeoutConfig {
    pub fn registration(&self) -> Duration {
        Duration::from_secs(u64::from(self.registration_secs))
    }

    pub fn handshake(&self) -> Duration {
        Duration::from_secs(u64::from(self.handshake_secs))
    }
}
