use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default prefix for identities registered by a sender.
pub const SENDER_ID_PREFIX: &str = "screen-";

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generate a sender identity: `prefix` followed by nine base-36 characters.
pub fn generate_sender_id(prefix: &str) -> PeerId {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    PeerId(format!("{prefix}{suffix}"))
}

/// Identity of a peer endpoint within the signaling service's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate an anonymous identity, as the signaling service does for
    /// registrations that do not ask for one.
    pub fn anonymous() -> Self {
        Self(new_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PeerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PeerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
