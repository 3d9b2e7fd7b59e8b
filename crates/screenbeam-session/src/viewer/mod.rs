//! Viewer role: announce ourselves to a sender and render its call.

mod machine;
mod types;


pub use machine::ViewerSession;
pub use types::{ViewerCommand, ViewerOptions, ViewerState};
