#![forbid(unsafe_code)]

//! The UI flag snapshot.
//!
//! [`UiFlags`] is recomputed from live document predicates on every
//! reconciliation pass and never persisted. A predicate read against a
//! missing root simply leaves the bit unset — missing elements mean "feature
//! currently inactive", never an error.

use crate::config::EngineConfig;
use crate::contract::{TabId, host};
use crate::registry::{FragmentSlot, SlotTable};
use bitflags::bitflags;
use tabweld_host::{Document, NodeId};

bitflags! {
    /// One bit per host UI boolean, true iff its predicate currently holds.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct UiFlags: u16 {
        /// Theater mode is active on the page root.
        const THEATER = 1 << 0;
        /// A managed tab is selected.
        const TAB_SELECTED = 1 << 1;
        /// A chat root exists and is expanded.
        const CHAT_EXPANDED = 1 << 2;
        /// A chat root exists and is collapsed.
        const CHAT_COLLAPSED = 1 << 3;
        /// The host is in two-column layout.
        const TWO_COLUMN = 1 << 4;
        /// At least one engagement panel is expanded.
        const PANEL_EXPANDED = 1 << 5;
        /// Fullscreen is active.
        const FULLSCREEN = 1 << 6;
        /// A playlist root exists and is open outside its own managed tab.
        const PLAYLIST_EXPANDED = 1 << 7;
        /// A registered external plugin is active on the page root.
        const PLUGIN_ACTIVE = 1 << 8;
    }
}

/// Compute a fresh snapshot from live predicates. Slot reads are
/// self-healing, so a stale registry entry reads as an unset bit.
pub fn compute(doc: &Document, slots: &mut SlotTable, config: &EngineConfig) -> UiFlags {
    let mut q = UiFlags::empty();
    let root = slots.get(FragmentSlot::PageRoot, doc);

    if let Some(root) = root {
        if doc.has_attribute(root, host::THEATER) {
            q |= UiFlags::THEATER;
        }
        if doc.has_attribute(root, host::FULLSCREEN) {
            q |= UiFlags::FULLSCREEN;
        }
        if doc.has_attribute(root, host::TWO_COLUMN) {
            q |= UiFlags::TWO_COLUMN;
        }
        if doc.has_attribute(root, crate::contract::root_attr::TAB) {
            q |= UiFlags::TAB_SELECTED;
        }
        if config
            .plugin_attributes
            .iter()
            .any(|a| doc.has_attribute(root, a))
        {
            q |= UiFlags::PLUGIN_ACTIVE;
        }
        if !expanded_engagement_panels(doc, root, &config.engagement_panel_tag).is_empty() {
            q |= UiFlags::PANEL_EXPANDED;
        }
    }

    if let Some(chat) = slots.get(FragmentSlot::Chat, doc) {
        if doc.has_attribute(chat, host::COLLAPSED) {
            q |= UiFlags::CHAT_COLLAPSED;
        } else {
            q |= UiFlags::CHAT_EXPANDED;
        }
    }

    if let Some(playlist) = slots.get(FragmentSlot::Playlist, doc) {
        // A playlist showing inside its own tab container does not compete
        // for the region; the tab already owns it.
        let in_own_tab = root.is_some_and(|r| {
            doc.get_attribute(r, crate::contract::root_attr::TAB)
                == Some(TabId::Playlist.as_str())
        });
        if !in_own_tab
            && !doc.has_attribute(playlist, host::HIDDEN)
            && !doc.has_attribute(playlist, host::COLLAPSED)
        {
            q |= UiFlags::PLAYLIST_EXPANDED;
        }
    }

    q
}

/// All engagement panels under `root` currently expanded.
pub fn expanded_engagement_panels(doc: &Document, root: NodeId, tag: &str) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(n) = stack.pop() {
        if doc.tag(n) == Some(tag)
            && doc.get_attribute(n, host::VISIBILITY) == Some(host::VISIBILITY_EXPANDED)
        {
            out.push(n);
        }
        stack.extend_from_slice(doc.children(n));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Document, SlotTable, EngineConfig) {
        let mut doc = Document::new();
        let root = doc.create_element("watch-page");
        doc.append_child(doc.root(), root);
        let mut slots = SlotTable::new();
        slots.set(FragmentSlot::PageRoot, Some(root));
        (doc, slots, EngineConfig::default())
    }

    #[test]
    fn missing_roots_leave_bits_unset() {
        let doc = Document::new();
        let mut slots = SlotTable::new();
        let config = EngineConfig::default();
        assert_eq!(compute(&doc, &mut slots, &config), UiFlags::empty());
    }

    #[test]
    fn chat_bit_tracks_collapsed_attribute() {
        let (mut doc, mut slots, config) = setup();
        let root = slots.peek(FragmentSlot::PageRoot).unwrap();
        let chat = doc.create_element("live-chat");
        doc.append_child(root, chat);
        slots.set(FragmentSlot::Chat, Some(chat));

        let q = compute(&doc, &mut slots, &config);
        assert!(q.contains(UiFlags::CHAT_EXPANDED));
        assert!(!q.contains(UiFlags::CHAT_COLLAPSED));

        doc.set_attribute(chat, host::COLLAPSED, "");
        let q = compute(&doc, &mut slots, &config);
        assert!(q.contains(UiFlags::CHAT_COLLAPSED));
        assert!(!q.contains(UiFlags::CHAT_EXPANDED));
    }

    #[test]
    fn detached_chat_reads_as_no_chat_bits() {
        let (mut doc, mut slots, config) = setup();
        let chat = doc.create_element("live-chat");
        slots.set(FragmentSlot::Chat, Some(chat));
        let q = compute(&doc, &mut slots, &config);
        assert!(!q.intersects(UiFlags::CHAT_EXPANDED | UiFlags::CHAT_COLLAPSED));
    }

    #[test]
    fn engagement_panel_expansion_sets_panel_bit() {
        let (mut doc, mut slots, config) = setup();
        let root = slots.peek(FragmentSlot::PageRoot).unwrap();
        let panel = doc.create_element("engagement-panel");
        doc.set_attribute(panel, host::VISIBILITY, host::VISIBILITY_HIDDEN);
        doc.append_child(root, panel);
        assert!(!compute(&doc, &mut slots, &config).contains(UiFlags::PANEL_EXPANDED));
        doc.set_attribute(panel, host::VISIBILITY, host::VISIBILITY_EXPANDED);
        assert!(compute(&doc, &mut slots, &config).contains(UiFlags::PANEL_EXPANDED));
    }

    #[test]
    fn open_playlist_inside_its_own_tab_is_not_competing() {
        let (mut doc, mut slots, config) = setup();
        let root = slots.peek(FragmentSlot::PageRoot).unwrap();
        let playlist = doc.create_element("playlist-panel");
        doc.append_child(root, playlist);
        slots.set(FragmentSlot::Playlist, Some(playlist));

        assert!(compute(&doc, &mut slots, &config).contains(UiFlags::PLAYLIST_EXPANDED));
        doc.set_attribute(root, crate::contract::root_attr::TAB, "playlist");
        assert!(!compute(&doc, &mut slots, &config).contains(UiFlags::PLAYLIST_EXPANDED));
    }

    #[test]
    fn plugin_attribute_sets_plugin_bit() {
        let (mut doc, mut slots, mut config) = setup();
        config.plugin_attributes = vec!["cinema-plus".to_string()];
        let root = slots.peek(FragmentSlot::PageRoot).unwrap();
        doc.set_attribute(root, "cinema-plus", "");
        assert!(compute(&doc, &mut slots, &config).contains(UiFlags::PLUGIN_ACTIVE));
    }
}
