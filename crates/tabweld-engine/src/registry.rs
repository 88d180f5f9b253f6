#![forbid(unsafe_code)]

//! Fragment registry: a fixed set of named slots holding handles to
//! host-owned elements.
//!
//! Slots hold generational [`NodeId`]s instead of weak references. A read
//! re-validates that the handle is still live *and* connected; anything else
//! clears the slot and reads as `None` (self-healing). Detach notifications
//! clear slots explicitly, so lifetimes are deterministic rather than
//! GC-driven.
//!
//! Setting a slot never errors, even if the element is connected somewhere
//! unexpected — callers are responsible for checking connectivity before
//! trusting a read.

use crate::epoch::EpochKey;
use tabweld_host::{Document, NodeId};
use tracing::trace;

/// The fixed set of fragments the engine tracks.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FragmentSlot {
    /// The "related items" list fragment.
    Related,
    /// The comments panel root.
    Comments,
    /// The description/info panel root.
    Info,
    /// The live-chat root.
    Chat,
    /// The playlist panel root.
    Playlist,
    /// The host page root the engine decorates.
    PageRoot,
}

impl FragmentSlot {
    pub const ALL: [FragmentSlot; 6] = [
        Self::Related,
        Self::Comments,
        Self::Info,
        Self::Chat,
        Self::Playlist,
        Self::PageRoot,
    ];

    fn index(self) -> usize {
        match self {
            Self::Related => 0,
            Self::Comments => 1,
            Self::Info => 2,
            Self::Chat => 3,
            Self::Playlist => 4,
            Self::PageRoot => 5,
        }
    }

    /// The epoch key guarding rebinds of this slot.
    pub fn epoch_key(self) -> EpochKey {
        match self {
            Self::Related => EpochKey::Related,
            Self::Comments => EpochKey::Comments,
            Self::Info => EpochKey::Info,
            Self::Chat => EpochKey::Chat,
            Self::Playlist => EpochKey::Playlist,
            Self::PageRoot => EpochKey::PageRoot,
        }
    }
}

/// Fixed arena of fragment slots.
#[derive(Debug, Default)]
pub struct SlotTable {
    slots: [Option<NodeId>; 6],
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, slot: FragmentSlot, node: Option<NodeId>) {
        self.slots[slot.index()] = node;
    }

    /// Self-healing read: returns the node only if it is live and connected,
    /// clearing the slot otherwise.
    pub fn get(&mut self, slot: FragmentSlot, doc: &Document) -> Option<NodeId> {
        let node = self.slots[slot.index()]?;
        if doc.is_alive(node) && doc.is_connected(node) {
            Some(node)
        } else {
            trace!(?slot, "clearing stale fragment slot");
            self.slots[slot.index()] = None;
            None
        }
    }

    /// Raw read without validation. Test and diagnostics use only.
    pub fn peek(&self, slot: FragmentSlot) -> Option<NodeId> {
        self.slots[slot.index()]
    }

    pub fn invalidate(&mut self, slot: FragmentSlot) {
        self.slots[slot.index()] = None;
    }

    pub fn clear_all(&mut self) {
        self.slots = [None; 6];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_clears_disconnected_entries() {
        let mut doc = Document::new();
        let chat = doc.create_element("live-chat");
        doc.append_child(doc.root(), chat);
        let mut slots = SlotTable::new();
        slots.set(FragmentSlot::Chat, Some(chat));
        assert_eq!(slots.get(FragmentSlot::Chat, &doc), Some(chat));

        doc.detach(chat);
        assert_eq!(slots.get(FragmentSlot::Chat, &doc), None);
        assert_eq!(slots.peek(FragmentSlot::Chat), None);
    }

    #[test]
    fn get_clears_destroyed_entries() {
        let mut doc = Document::new();
        let node = doc.create_element("playlist-panel");
        doc.append_child(doc.root(), node);
        let mut slots = SlotTable::new();
        slots.set(FragmentSlot::Playlist, Some(node));
        doc.destroy(node);
        assert_eq!(slots.get(FragmentSlot::Playlist, &doc), None);
    }

    #[test]
    fn clear_all_empties_every_slot() {
        let mut doc = Document::new();
        let node = doc.create_element("x");
        doc.append_child(doc.root(), node);
        let mut slots = SlotTable::new();
        for slot in FragmentSlot::ALL {
            slots.set(slot, Some(node));
        }
        slots.clear_all();
        for slot in FragmentSlot::ALL {
            assert_eq!(slots.get(slot, &doc), None);
        }
    }
}
