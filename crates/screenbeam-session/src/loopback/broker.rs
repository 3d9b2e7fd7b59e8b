//! In-process signaling broker.
//!
//! Every endpoint registered on the same [`LoopbackBroker`] can reach every
//! other one. Handles are allocated from one counter so each end of a
//! channel or call has its own id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use screenbeam_common::{PeerId, SessionError, SignalingErrorKind};
use tracing::{debug, info};

use crate::input::SignalSink;
use crate::media::MediaStream;
use crate::signaling::{CallId, ChannelId, SignalEvent, Signaling};

struct PeerEntry {
    sink: SignalSink,
    online: bool,
}

struct ChannelEnd {
    owner: PeerId,
    twin: ChannelId,
}

struct CallEnd {
    owner: PeerId,
    remote: PeerId,
    twin: CallId,
    /// Media offered to this end; only the callee's end carries one.
    offered: Option<MediaStream>,
}

#[derive(Default)]
struct BrokerState {
    next_handle: u64,
    peers: HashMap<PeerId, PeerEntry>,
    channels: HashMap<ChannelId, ChannelEnd>,
    calls: HashMap<CallId, CallEnd>,
}

impl BrokerState {
    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn emit(&self, peer: &PeerId, event: SignalEvent) {
        if let Some(entry) = self.peers.get(peer) {
            entry.sink.emit(event);
        }
    }

    fn is_online(&self, peer: &PeerId) -> bool {
        self.peers.get(peer).is_some_and(|p| p.online)
    }

    /// Remove both ends of `channel`, notifying the remote end's owner.
    fn close_channel(&mut self, channel: ChannelId) {
        let Some(end) = self.channels.remove(&channel) else {
            return;
        };
        if let Some(twin) = self.channels.remove(&end.twin) {
            self.emit(&twin.owner, SignalEvent::ChannelClose { channel: end.twin });
        }
    }

    /// Remove both ends of `call`, notifying the remote end's owner.
    fn close_call(&mut self, call: CallId) {
        let Some(end) = self.calls.remove(&call) else {
            return;
        };
        if let Some(twin) = self.calls.remove(&end.twin) {
            self.emit(&twin.owner, SignalEvent::CallClose { call: end.twin });
        }
    }

    fn remove_peer(&mut self, peer: &PeerId) {
        let channels: Vec<ChannelId> = self
            .channels
            .iter()
            .filter(|(_, end)| &end.owner == peer)
            .map(|(id, _)| *id)
            .collect();
        for channel in channels {
            self.close_channel(channel);
        }

        let calls: Vec<CallId> = self
            .calls
            .iter()
            .filter(|(_, end)| &end.owner == peer)
            .map(|(id, _)| *id)
            .collect();
        for call in calls {
            self.close_call(call);
        }

        self.peers.remove(peer);
    }
}

// ---------------------------------------------------------------------------
// Broker
// ---------------------------------------------------------------------------

/// Shared broker state. Cheap to clone; clones see the same peers.
#[derive(Clone, Default)]
pub struct LoopbackBroker {
    inner: Arc<Mutex<BrokerState>>,
}

impl LoopbackBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new, unregistered endpoint on this broker.
    pub fn endpoint(&self) -> LoopbackSignaling {
        LoopbackSignaling {
            broker: self.clone(),
            me: None,
        }
    }

    pub fn peer_count(&self) -> usize {
        self.with(|state| state.peers.len()).unwrap_or(0)
    }

    pub fn is_registered(&self, peer: &PeerId) -> bool {
        self.with(|state| state.peers.contains_key(peer))
            .unwrap_or(false)
    }

    pub fn is_online(&self, peer: &PeerId) -> bool {
        self.with(|state| state.is_online(peer)).unwrap_or(false)
    }

    /// Channel ends owned by `peer`.
    pub fn open_channels(&self, peer: &PeerId) -> usize {
        self.with(|state| state.channels.values().filter(|e| &e.owner == peer).count())
            .unwrap_or(0)
    }

    /// Call ends owned by `peer`.
    pub fn open_calls(&self, peer: &PeerId) -> usize {
        self.with(|state| state.calls.values().filter(|e| &e.owner == peer).count())
            .unwrap_or(0)
    }

    /// Whether `from` currently has a call placed to `to`.
    pub fn has_call(&self, from: &PeerId, to: &PeerId) -> bool {
        self.with(|state| {
            state
                .calls
                .values()
                .any(|e| &e.owner == from && &e.remote == to && e.offered.is_none())
        })
        .unwrap_or(false)
    }

    /// Simulate the transport to the service dropping for `peer`. Its
    /// channels and calls survive; the identity stays reserved.
    pub fn drop_transport(&self, peer: &PeerId) {
        let _ = self.with(|state| {
            if let Some(entry) = state.peers.get_mut(peer) {
                entry.online = false;
                entry.sink.emit(SignalEvent::Disconnected);
                info!(peer = %peer, "Loopback transport dropped");
            }
        });
    }

    /// Fail one call end: its owner gets `CallError` and both ends go away
    /// without a close notification.
    pub fn fail_call(&self, call: CallId, message: &str) {
        let _ = self.with(|state| {
            let Some(end) = state.calls.remove(&call) else {
                return;
            };
            state.calls.remove(&end.twin);
            state.emit(
                &end.owner,
                SignalEvent::CallError {
                    call,
                    message: message.to_string(),
                },
            );
        });
    }

    fn with<R>(&self, f: impl FnOnce(&mut BrokerState) -> R) -> Option<R> {
        self.inner.lock().ok().map(|mut state| f(&mut state))
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// One peer's view of a [`LoopbackBroker`]. Destroys its registration when
/// dropped.
pub struct LoopbackSignaling {
    broker: LoopbackBroker,
    me: Option<PeerId>,
}

impl LoopbackSignaling {
    pub fn id(&self) -> Option<&PeerId> {
        self.me.as_ref()
    }

    fn registered(&self) -> Result<PeerId, SessionError> {
        self.me.clone().ok_or_else(|| {
            SessionError::signaling(SignalingErrorKind::Disconnected, "not registered")
        })
    }

    fn with<R>(&self, f: impl FnOnce(&mut BrokerState) -> R) -> Result<R, SessionError> {
        self.broker.with(f).ok_or_else(|| {
            SessionError::signaling(SignalingErrorKind::ServerError, "broker unavailable")
        })
    }
}

impl Signaling for LoopbackSignaling {
    fn register(&mut self, id: Option<PeerId>, sink: SignalSink) -> Result<(), SessionError> {
        self.destroy();
        let id = id.unwrap_or_else(PeerId::anonymous);

        let registered = self.with(|state| {
            if state.peers.contains_key(&id) {
                sink.emit(SignalEvent::Error {
                    kind: SignalingErrorKind::UnavailableId,
                    message: format!("ID \"{id}\" is taken"),
                });
                return false;
            }
            state.peers.insert(
                id.clone(),
                PeerEntry {
                    sink: sink.clone(),
                    online: true,
                },
            );
            sink.emit(SignalEvent::Open { id: id.clone() });
            true
        })?;

        if registered {
            debug!(peer = %id, "Loopback peer registered");
            self.me = Some(id);
        }
        Ok(())
    }

    fn connect(&mut self, target: &PeerId) -> Result<ChannelId, SessionError> {
        let me = self.registered()?;
        self.with(|state| {
            let local = ChannelId(state.next_handle());
            if !state.is_online(&me) {
                return Err(SessionError::signaling(
                    SignalingErrorKind::Disconnected,
                    "transport is down",
                ));
            }
            if !state.is_online(target) {
                state.emit(
                    &me,
                    SignalEvent::Error {
                        kind: SignalingErrorKind::PeerUnavailable,
                        message: format!("Could not connect to peer {target}"),
                    },
                );
                return Ok(local);
            }

            let remote = ChannelId(state.next_handle());
            state.channels.insert(
                local,
                ChannelEnd {
                    owner: me.clone(),
                    twin: remote,
                },
            );
            state.channels.insert(
                remote,
                ChannelEnd {
                    owner: target.clone(),
                    twin: local,
                },
            );
            state.emit(
                target,
                SignalEvent::Connection {
                    channel: remote,
                    peer: me.clone(),
                },
            );
            state.emit(target, SignalEvent::ChannelOpen { channel: remote });
            state.emit(&me, SignalEvent::ChannelOpen { channel: local });
            Ok(local)
        })?
    }

    fn send(&mut self, channel: ChannelId, payload: &str) -> Result<(), SessionError> {
        let me = self.registered()?;
        self.with(|state| {
            let twin = state
                .channels
                .get(&channel)
                .filter(|end| end.owner == me)
                .map(|end| end.twin);
            let owner = twin.and_then(|t| state.channels.get(&t)).map(|e| e.owner.clone());
            match (twin, owner) {
                (Some(twin), Some(owner)) => {
                    state.emit(
                        &owner,
                        SignalEvent::ChannelData {
                            channel: twin,
                            payload: payload.to_string(),
                        },
                    );
                    Ok(())
                }
                _ => Err(SessionError::signaling(
                    SignalingErrorKind::PeerUnavailable,
                    format!("data channel {channel} is closed"),
                )),
            }
        })?
    }

    fn close_channel(&mut self, channel: ChannelId) {
        let _ = self.with(|state| state.close_channel(channel));
    }

    fn call(&mut self, target: &PeerId, stream: &MediaStream) -> Result<CallId, SessionError> {
        let me = self.registered()?;
        self.with(|state| {
            if !state.is_online(target) {
                return Err(SessionError::signaling(
                    SignalingErrorKind::PeerUnavailable,
                    format!("Could not connect to peer {target}"),
                ));
            }
            let local = CallId(state.next_handle());
            let remote = CallId(state.next_handle());
            state.calls.insert(
                local,
                CallEnd {
                    owner: me.clone(),
                    remote: target.clone(),
                    twin: remote,
                    offered: None,
                },
            );
            state.calls.insert(
                remote,
                CallEnd {
                    owner: target.clone(),
                    remote: me.clone(),
                    twin: local,
                    offered: Some(stream.clone()),
                },
            );
            state.emit(
                target,
                SignalEvent::IncomingCall {
                    call: remote,
                    peer: me.clone(),
                },
            );
            Ok(local)
        })?
    }

    fn answer(&mut self, call: CallId) -> Result<(), SessionError> {
        let me = self.registered()?;
        self.with(|state| {
            let stream = state
                .calls
                .get(&call)
                .filter(|end| end.owner == me)
                .and_then(|end| end.offered.clone());
            match stream {
                Some(stream) => {
                    state.emit(&me, SignalEvent::CallStream { call, stream });
                    Ok(())
                }
                None => Err(SessionError::Call(format!("call {call} is no longer offered"))),
            }
        })?
    }

    fn hang_up(&mut self, call: CallId) {
        let _ = self.with(|state| state.close_call(call));
    }

    fn reconnect(&mut self) -> Result<(), SessionError> {
        let me = self.registered()?;
        self.with(|state| match state.peers.get_mut(&me) {
            Some(entry) => {
                entry.online = true;
                entry.sink.emit(SignalEvent::Open { id: me.clone() });
                Ok(())
            }
            None => Err(SessionError::signaling(
                SignalingErrorKind::Disconnected,
                "registration is gone",
            )),
        })?
    }

    fn destroy(&mut self) {
        let Some(me) = self.me.take() else {
            return;
        };
        let _ = self.with(|state| state.remove_peer(&me));
        debug!(peer = %me, "Loopback peer destroyed");
    }
}

impl Drop for LoopbackSignaling {
    fn drop(&mut self) {
        self.destroy();
    }
}
