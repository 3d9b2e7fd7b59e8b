//! PeerJS server registration over WebSocket.

mod client;
mod connection;
mod types;

#[cfg(test)]
mod tests;

pub use client::PeerServerLink;
pub use types::{event_for, ws_url, ClientMessage, MessageType, ServerMessage};
