pub mod errors;
pub mod id;
pub mod status;

pub use errors::{ConfigError, ScreenbeamError, SessionError, SignalingErrorKind, Stage};
pub use id::{generate_sender_id, new_id, PeerId, SENDER_ID_PREFIX};
pub use status::{Status, StatusLevel};

pub type Result<T> = std::result::Result<T, ScreenbeamError>;
