#![forbid(unsafe_code)]

//! Simulated SPA host for driving the engine in tests and demos.
//!
//! [`HostSim`] plays the host application: it renders a watch page with a
//! side column, defines component classes, attaches and detaches the
//! fragments the engine tracks, and fires navigation signals, all through
//! the same `tabweld-host` surface a real adapter would use. The [`trace`]
//! module turns the document's mutation history into a JSONL action trace
//! for golden comparisons and debugging.

pub mod trace;

use tabweld_host::{HostPage, NodeId};
use tracing::debug;

/// Component classes the simulated host defines, in definition order.
pub const HOST_CLASSES: [&str; 6] = [
    "watch-page",
    "related-list",
    "comments-section",
    "description-panel",
    "live-chat",
    "playlist-panel",
];

/// A scripted host application.
pub struct HostSim {
    pub page: HostPage,
    root: NodeId,
    side_column: NodeId,
    chat: Option<NodeId>,
    playlist: Option<NodeId>,
}

impl HostSim {
    /// Render the initial watch page and define every host class.
    pub fn new() -> Self {
        let mut page = HostPage::new();
        page.document.set_history(true);
        let doc_root = page.document.root();
        let root = page.document.create_element("watch-page");
        page.document.set_component(root, "watch-page");
        page.document.append_child(doc_root, root);
        let side_column = page.document.create_element("aside");
        page.document.set_attribute(side_column, "id", "secondary");
        page.document.append_child(root, side_column);
        for class in HOST_CLASSES {
            page.classes.define(class);
        }
        Self {
            page,
            root,
            side_column,
            chat: None,
            playlist: None,
        }
    }

    /// Build a host that has not yet defined the given classes, for
    /// deferred-installation scenarios.
    pub fn with_undefined_classes(undefined: &[&str]) -> Self {
        let mut sim = Self::new();
        let mut page = HostPage::new();
        std::mem::swap(&mut page.document, &mut sim.page.document);
        for class in HOST_CLASSES {
            if !undefined.contains(&class) {
                page.classes.define(class);
            }
        }
        sim.page = page;
        sim
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn side_column(&self) -> NodeId {
        self.side_column
    }

    pub fn define_class(&mut self, class: &str) {
        self.page.classes.define(class);
    }

    /// Fire the SPA's navigation-finished signal.
    pub fn navigate(&mut self) {
        debug!("host: navigation finished");
        self.page.finish_navigation();
    }

    fn attach_fragment(&mut self, class: &str, parent: NodeId) -> NodeId {
        let n = self.page.document.create_element(class);
        self.page.document.set_component(n, class);
        self.page.document.append_child(parent, n);
        n
    }

    pub fn attach_related(&mut self) -> NodeId {
        let side = self.side_column;
        self.attach_fragment("related-list", side)
    }

    pub fn attach_comments(&mut self) -> NodeId {
        let root = self.root;
        self.attach_fragment("comments-section", root)
    }

    pub fn attach_description(&mut self) -> NodeId {
        let root = self.root;
        self.attach_fragment("description-panel", root)
    }

    /// Attach a live chat, expanded or collapsed.
    pub fn attach_chat(&mut self, collapsed: bool) -> NodeId {
        let chat = self.page.document.create_element("live-chat");
        self.page.document.set_component(chat, "live-chat");
        if collapsed {
            self.page.document.set_attribute(chat, "collapsed", "");
        }
        self.page.document.append_child(self.root, chat);
        self.chat = Some(chat);
        chat
    }

    pub fn detach_chat(&mut self) {
        if let Some(chat) = self.chat.take() {
            self.page.document.detach(chat);
        }
    }

    pub fn set_chat_collapsed(&mut self, collapsed: bool) {
        if let Some(chat) = self.chat {
            if collapsed {
                self.page.document.set_attribute(chat, "collapsed", "");
            } else {
                self.page.document.remove_attribute(chat, "collapsed");
            }
        }
    }

    /// Attach a playlist panel, open or hidden.
    pub fn attach_playlist(&mut self, open: bool) -> NodeId {
        let playlist = self.page.document.create_element("playlist-panel");
        self.page.document.set_component(playlist, "playlist-panel");
        if !open {
            self.page.document.set_attribute(playlist, "hidden", "");
        }
        self.page.document.append_child(self.root, playlist);
        self.playlist = Some(playlist);
        playlist
    }

    pub fn detach_playlist(&mut self) {
        if let Some(playlist) = self.playlist.take() {
            self.page.document.detach(playlist);
        }
    }

    pub fn set_playlist_hidden(&mut self, hidden: bool) {
        if let Some(playlist) = self.playlist {
            if hidden {
                self.page.document.set_attribute(playlist, "hidden", "");
            } else {
                self.page.document.remove_attribute(playlist, "hidden");
            }
        }
    }

    pub fn set_theater(&mut self, on: bool) {
        self.set_root_flag("theater", on);
    }

    pub fn set_fullscreen(&mut self, on: bool) {
        self.set_root_flag("fullscreen", on);
    }

    pub fn set_two_column(&mut self, on: bool) {
        self.set_root_flag("is-two-columns", on);
    }

    fn set_root_flag(&mut self, name: &str, on: bool) {
        if on {
            self.page.document.set_attribute(self.root, name, "");
        } else {
            self.page.document.remove_attribute(self.root, name);
        }
    }

    /// Attach an engagement panel in the hidden state.
    pub fn attach_engagement_panel(&mut self, target: &str) -> NodeId {
        let panel = self.page.document.create_element("engagement-panel");
        self.page
            .document
            .set_attribute(panel, "visibility", "HIDDEN");
        self.page.document.set_attribute(panel, "target-id", target);
        self.page.document.append_child(self.root, panel);
        panel
    }

    pub fn expand_engagement_panel(&mut self, panel: NodeId) {
        self.page
            .document
            .set_attribute(panel, "visibility", "EXPANDED");
    }

    /// Dump and clear the recorded mutation history as a JSONL trace.
    pub fn take_trace(&mut self) -> String {
        let history = self.page.document.take_history();
        trace::to_jsonl(&trace::records(&history))
    }
}

impl Default for HostSim {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_builds_a_connected_watch_page() {
        let sim = HostSim::new();
        assert!(sim.page.document.is_connected(sim.root()));
        assert_eq!(
            sim.page.document.get_attribute(sim.side_column(), "id"),
            Some("secondary")
        );
        for class in HOST_CLASSES {
            assert!(sim.page.classes.is_defined(class));
        }
    }

    #[test]
    fn undefined_classes_are_held_back() {
        let sim = HostSim::with_undefined_classes(&["live-chat"]);
        assert!(!sim.page.classes.is_defined("live-chat"));
        assert!(sim.page.classes.is_defined("watch-page"));
    }
}
