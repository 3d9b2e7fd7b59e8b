//! Sender role: capture the screen, advertise an identity, call every
//! viewer that announces itself.

mod machine;
mod registry;
mod types;


pub use machine::SenderSession;
pub use registry::ViewerEntry;
pub use types::{SenderCommand, SenderOptions, SenderState};
