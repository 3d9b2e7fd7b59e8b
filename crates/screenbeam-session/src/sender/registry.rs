//! Connected-viewer bookkeeping for the sender.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use screenbeam_common::PeerId;

use crate::signaling::{CallId, ChannelId};

/// A viewer with at least one open, identified data channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerEntry {
    pub viewer: PeerId,
    /// Every open channel the viewer has identified itself on.
    pub channels: BTreeSet<ChannelId>,
    /// Outbound media call, `None` until placed or after it failed.
    pub call: Option<CallId>,
}

/// Result of an identity message on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Admission {
    /// First open channel for this viewer.
    Joined,
    /// The viewer was already registered; the channel is now bound to it.
    Repeated,
    /// The channel already belongs to another viewer; nothing changed.
    Conflict { bound_to: PeerId },
}

/// Membership is exactly the viewers with an open, identified data channel.
/// A channel is bound to at most one viewer; a viewer stays registered until
/// its last channel closes. Channels accepted but not yet identified are
/// tracked separately and never counted.
#[derive(Debug, Default)]
pub(crate) struct ViewerRegistry {
    viewers: BTreeMap<PeerId, ViewerEntry>,
    /// Identified channel -> its viewer.
    bound: HashMap<ChannelId, PeerId>,
    /// Accepted channel -> peer the signaling service says opened it.
    pending: HashMap<ChannelId, PeerId>,
}

impl ViewerRegistry {
    pub(crate) fn accept(&mut self, channel: ChannelId, peer: PeerId) {
        self.pending.insert(channel, peer);
    }

    pub(crate) fn is_pending(&self, channel: ChannelId) -> bool {
        self.pending.contains_key(&channel)
    }

    /// Whether `channel` was accepted, identified or not.
    pub(crate) fn knows_channel(&self, channel: ChannelId) -> bool {
        self.is_pending(channel) || self.bound.contains_key(&channel)
    }

    /// Bind `channel` to `viewer`. An identified channel keeps its first
    /// identity for as long as it stays open.
    pub(crate) fn admit(&mut self, channel: ChannelId, viewer: PeerId) -> Admission {
        if let Some(owner) = self.bound.get(&channel) {
            if *owner != viewer {
                return Admission::Conflict {
                    bound_to: owner.clone(),
                };
            }
        }

        self.pending.remove(&channel);
        self.bound.insert(channel, viewer.clone());
        match self.viewers.get_mut(&viewer) {
            Some(entry) => {
                entry.channels.insert(channel);
                Admission::Repeated
            }
            None => {
                self.viewers.insert(
                    viewer.clone(),
                    ViewerEntry {
                        viewer,
                        channels: BTreeSet::from([channel]),
                        call: None,
                    },
                );
                Admission::Joined
            }
        }
    }

    pub(crate) fn set_call(&mut self, viewer: &PeerId, call: CallId) {
        if let Some(entry) = self.viewers.get_mut(viewer) {
            entry.call = Some(call);
        }
    }

    pub(crate) fn call_for(&self, viewer: &PeerId) -> Option<CallId> {
        self.viewers.get(viewer).and_then(|e| e.call)
    }

    /// Forget `call`, returning the viewer it belonged to.
    pub(crate) fn clear_call(&mut self, call: CallId) -> Option<PeerId> {
        let entry = self.viewers.values_mut().find(|e| e.call == Some(call))?;
        entry.call = None;
        Some(entry.viewer.clone())
    }

    /// Drop whatever is attached to `channel`. Returns the viewer entry only
    /// when this was the viewer's last open channel.
    pub(crate) fn remove_channel(&mut self, channel: ChannelId) -> Option<ViewerEntry> {
        self.pending.remove(&channel);
        let viewer = self.bound.remove(&channel)?;
        let entry = self.viewers.get_mut(&viewer)?;
        entry.channels.remove(&channel);
        if entry.channels.is_empty() {
            self.viewers.remove(&viewer)
        } else {
            None
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.viewers.len()
    }

    pub(crate) fn ids(&self) -> Vec<PeerId> {
        self.viewers.keys().cloned().collect()
    }

    pub(crate) fn entries(&self) -> Vec<ViewerEntry> {
        self.viewers.values().cloned().collect()
    }

    /// Empty the registry, returning every identified entry and every
    /// still-pending channel.
    pub(crate) fn drain(&mut self) -> (Vec<ViewerEntry>, Vec<ChannelId>) {
        self.bound.clear();
        let entries = std::mem::take(&mut self.viewers).into_values().collect();
        let pending = std::mem::take(&mut self.pending).into_keys().collect();
        (entries, pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PeerId {
        PeerId::from(s)
    }

    #[test]
    fn pending_channels_are_not_counted() {
        let mut reg = ViewerRegistry::default();
        reg.accept(ChannelId(1), id("v1"));
        assert!(reg.is_pending(ChannelId(1)));
        assert!(reg.knows_channel(ChannelId(1)));
        assert_eq!(reg.len(), 0);

        assert_eq!(reg.admit(ChannelId(1), id("v1")), Admission::Joined);
        assert!(!reg.is_pending(ChannelId(1)));
        assert!(reg.knows_channel(ChannelId(1)));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn repeated_handshake_does_not_duplicate() {
        let mut reg = ViewerRegistry::default();
        assert_eq!(reg.admit(ChannelId(1), id("v1")), Admission::Joined);
        reg.set_call(&id("v1"), CallId(10));
        assert_eq!(reg.admit(ChannelId(1), id("v1")), Admission::Repeated);
        assert_eq!(reg.admit(ChannelId(2), id("v1")), Admission::Repeated);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.call_for(&id("v1")), Some(CallId(10)));
    }

    #[test]
    fn viewer_leaves_with_its_last_channel() {
        for (first, second) in [(ChannelId(1), ChannelId(2)), (ChannelId(2), ChannelId(1))] {
            let mut reg = ViewerRegistry::default();
            reg.admit(ChannelId(1), id("v1"));
            reg.admit(ChannelId(2), id("v1"));
            reg.set_call(&id("v1"), CallId(10));

            assert!(reg.remove_channel(first).is_none());
            assert_eq!(reg.len(), 1);
            assert_eq!(reg.call_for(&id("v1")), Some(CallId(10)));

            let removed = reg.remove_channel(second).unwrap();
            assert_eq!(removed.viewer, id("v1"));
            assert_eq!(removed.call, Some(CallId(10)));
            assert_eq!(reg.len(), 0);
            assert!(!reg.knows_channel(first));
            assert!(!reg.knows_channel(second));
        }
    }

    #[test]
    fn identified_channel_keeps_its_identity() {
        let mut reg = ViewerRegistry::default();
        reg.admit(ChannelId(1), id("v1"));
        assert_eq!(
            reg.admit(ChannelId(1), id("v2")),
            Admission::Conflict { bound_to: id("v1") }
        );
        assert_eq!(reg.ids(), vec![id("v1")]);

        assert!(reg.remove_channel(ChannelId(1)).is_some());
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn calls_are_tracked_per_viewer() {
        let mut reg = ViewerRegistry::default();
        reg.admit(ChannelId(1), id("v1"));
        reg.admit(ChannelId(2), id("v2"));
        reg.set_call(&id("v1"), CallId(10));
        reg.set_call(&id("v2"), CallId(20));

        assert_eq!(reg.clear_call(CallId(20)), Some(id("v2")));
        assert_eq!(reg.call_for(&id("v2")), None);
        assert_eq!(reg.call_for(&id("v1")), Some(CallId(10)));
        assert_eq!(reg.clear_call(CallId(99)), None);
    }

    #[test]
    fn drain_empties_everything() {
        let mut reg = ViewerRegistry::default();
        reg.admit(ChannelId(1), id("v1"));
        reg.accept(ChannelId(2), id("v2"));
        let (entries, pending) = reg.drain();
        assert_eq!(entries.len(), 1);
        assert_eq!(pending, vec![ChannelId(2)]);
        assert_eq!(reg.len(), 0);
        assert!(!reg.knows_channel(ChannelId(1)));
        assert!(!reg.knows_channel(ChannelId(2)));
    }

    #[test]
    fn ids_are_sorted() {
        let mut reg = ViewerRegistry::default();
        reg.admit(ChannelId(1), id("v2"));
        reg.admit(ChannelId(2), id("v1"));
        assert_eq!(reg.ids(), vec![id("v1"), id("v2")]);
    }
}
