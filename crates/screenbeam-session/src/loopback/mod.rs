//! In-process stand-ins for the external collaborators: a signaling broker
//! every local endpoint can reach, plus capture sources and players that
//! need no browser.

mod broker;
mod media;


pub use broker::{LoopbackBroker, LoopbackSignaling};
pub use media::{CaptureGate, SyntheticCapture, SyntheticPlayer};
