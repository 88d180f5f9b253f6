#![forbid(unsafe_code)]

//! The managed tab container.
//!
//! Built exactly once per page session: the side column's existing children
//! are wrapped in a managed wrapper, a tab bar goes in front, and one content
//! container per tab follows it. The containers are reused across
//! navigations and addressed by the fixed ids in [`crate::contract::ids`];
//! only a full page unload destroys them.

use crate::contract::{TabId, ids, root_attr};
use crate::registry::FragmentSlot;
use crate::reparent::{ReparentError, reparent};
use tabweld_host::{Document, NodeId};
use tracing::debug;

/// Handles to the one-time container structure.
#[derive(Clone, Copy, Debug)]
pub struct Containers {
    pub wrapper: NodeId,
    pub tab_bar: NodeId,
    content: [NodeId; 4],
}

impl Containers {
    pub fn content(&self, tab: TabId) -> NodeId {
        match tab {
            TabId::Info => self.content[0],
            TabId::Comments => self.content[1],
            TabId::Videos => self.content[2],
            TabId::Playlist => self.content[3],
        }
    }
}

/// The content container a fragment slot is relocated into, if any. Chat
/// stays wherever the host put it; only its collapsed state is managed.
pub fn home_tab(slot: FragmentSlot) -> Option<TabId> {
    match slot {
        FragmentSlot::Related => Some(TabId::Videos),
        FragmentSlot::Comments => Some(TabId::Comments),
        FragmentSlot::Info => Some(TabId::Info),
        FragmentSlot::Playlist => Some(TabId::Playlist),
        FragmentSlot::Chat | FragmentSlot::PageRoot => None,
    }
}

/// Wrap the side column and build the tab bar and content containers.
pub fn insert_containers(doc: &mut Document, side_column: NodeId) -> Containers {
    let mut doc = doc.as_engine();
    debug!(?side_column, "inserting managed tab container");

    let wrapper = doc.create_element("div");
    doc.set_attribute(wrapper, "id", ids::SECONDARY_WRAPPER);
    let existing: Vec<NodeId> = doc.children(side_column).to_vec();
    for child in existing {
        doc.append_child(wrapper, child);
    }
    doc.append_child(side_column, wrapper);

    let tab_bar = doc.create_element("nav");
    doc.set_attribute(tab_bar, "id", ids::TAB_BAR);
    for tab in TabId::ALL {
        let button = doc.create_element("button");
        doc.set_attribute(button, "tab", tab.as_str());
        doc.append_child(tab_bar, button);
    }
    let first = doc.children(wrapper).first().copied();
    doc.insert_before(wrapper, tab_bar, first);

    let mut content = [tab_bar; 4];
    let mut anchor = doc.next_sibling(tab_bar);
    for (i, tab) in TabId::ALL.iter().enumerate() {
        let section = doc.create_element("section");
        doc.set_attribute(section, "id", tab.content_id());
        doc.insert_before(wrapper, section, anchor);
        anchor = doc.next_sibling(section);
        content[i] = section;
    }

    Containers {
        wrapper,
        tab_bar,
        content,
    }
}

/// Recover container handles from a side column that already carries the
/// managed structure, as after an engine restart on a live page.
pub fn find_containers(doc: &Document, side_column: NodeId) -> Option<Containers> {
    let by_id = |parent: NodeId, id: &str| {
        doc.children(parent)
            .iter()
            .copied()
            .find(|&n| doc.get_attribute(n, "id") == Some(id))
    };
    let wrapper = by_id(side_column, ids::SECONDARY_WRAPPER)?;
    let tab_bar = by_id(wrapper, ids::TAB_BAR)?;
    let mut content = [tab_bar; 4];
    for (i, tab) in TabId::ALL.iter().enumerate() {
        content[i] = by_id(wrapper, tab.content_id())?;
    }
    Some(Containers {
        wrapper,
        tab_bar,
        content,
    })
}

/// Move a fragment into its content container, preserving its component
/// state. A no-op when the fragment already lives there.
pub fn place_fragment(
    doc: &mut Document,
    containers: &Containers,
    slot: FragmentSlot,
    fragment: NodeId,
) -> Result<(), ReparentError> {
    let Some(tab) = home_tab(slot) else {
        return Ok(());
    };
    let container = containers.content(tab);
    if doc.parent(fragment) == Some(container) {
        return Ok(());
    }
    debug!(?slot, tab = tab.as_str(), "placing fragment into content container");
    reparent(doc, container, fragment, &[], &[])
}

/// The tab currently recorded on the page root.
pub fn active_tab(doc: &Document, page_root: NodeId) -> Option<TabId> {
    doc.get_attribute(page_root, root_attr::TAB)
        .and_then(TabId::from_str)
}
