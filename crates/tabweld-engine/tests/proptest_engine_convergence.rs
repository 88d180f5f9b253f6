//! Property tests for pump-loop convergence under arbitrary host behavior.
//!
//! Any interleaving of host mutations, fragment attach/detach cycles, tab
//! selections, and navigations must leave the engine quiescent: a settle
//! run reaches a fixed point, a further pump consumes nothing, and the
//! mirrored root attributes respect region arbitration (no tab alongside an
//! expanded chat or competing playlist). The document mutation history is
//! audited per pump round: rounds that execute no current-ticket task must
//! leave no engine-actor record behind.

use proptest::prelude::*;
use tabweld_engine::contract::{host, root_attr};
use tabweld_engine::{Engine, TabId};
use tabweld_host::{Actor, HostPage, NodeId};

#[derive(Debug, Clone, Copy)]
enum HostOp {
    ToggleTheater,
    ToggleFullscreen,
    ToggleColumns,
    ToggleChatPresence,
    ToggleChatCollapsed,
    TogglePlaylistPresence,
    TogglePlaylistCollapsed,
    SelectTab(Option<TabId>),
    Navigate,
}

fn op_strategy() -> impl Strategy<Value = HostOp> {
    prop_oneof![
        Just(HostOp::ToggleTheater),
        Just(HostOp::ToggleFullscreen),
        Just(HostOp::ToggleColumns),
        Just(HostOp::ToggleChatPresence),
        Just(HostOp::ToggleChatCollapsed),
        Just(HostOp::TogglePlaylistPresence),
        Just(HostOp::TogglePlaylistCollapsed),
        prop_oneof![
            Just(None),
            Just(Some(TabId::Info)),
            Just(Some(TabId::Comments)),
            Just(Some(TabId::Videos)),
            Just(Some(TabId::Playlist)),
        ]
        .prop_map(HostOp::SelectTab),
        Just(HostOp::Navigate),
    ]
}

struct Sim {
    engine: Engine,
    page: HostPage,
    root: NodeId,
    chat: NodeId,
    playlist: NodeId,
    chat_attached: bool,
    playlist_attached: bool,
}

impl Sim {
    fn new() -> Self {
        let mut page = HostPage::new();
        let doc_root = page.document.root();
        let root = page.document.create_element("watch-page");
        page.document.set_component(root, "watch-page");
        page.document.append_child(doc_root, root);
        let aside = page.document.create_element("aside");
        page.document.set_attribute(aside, "id", "secondary");
        page.document.append_child(root, aside);
        for class in ["watch-page", "live-chat", "playlist-panel"] {
            page.classes.define(class);
        }
        let chat = page.document.create_element("live-chat");
        page.document.set_component(chat, "live-chat");
        let playlist = page.document.create_element("playlist-panel");
        page.document.set_component(playlist, "playlist-panel");

        let mut engine = Engine::default();
        page.finish_navigation();
        engine.run_until_idle(&mut page);
        Sim {
            engine,
            page,
            root,
            chat,
            playlist,
            chat_attached: false,
            playlist_attached: false,
        }
    }

    fn toggle_attr(&mut self, node: NodeId, name: &str) {
        if self.page.document.has_attribute(node, name) {
            self.page.document.remove_attribute(node, name);
        } else {
            self.page.document.set_attribute(node, name, "");
        }
    }

    fn apply(&mut self, op: HostOp) {
        match op {
            HostOp::ToggleTheater => self.toggle_attr(self.root, host::THEATER),
            HostOp::ToggleFullscreen => self.toggle_attr(self.root, host::FULLSCREEN),
            HostOp::ToggleColumns => self.toggle_attr(self.root, host::TWO_COLUMN),
            HostOp::ToggleChatPresence => {
                if self.chat_attached {
                    self.page.document.detach(self.chat);
                } else {
                    self.page.document.append_child(self.root, self.chat);
                }
                self.chat_attached = !self.chat_attached;
            }
            HostOp::ToggleChatCollapsed => self.toggle_attr(self.chat, host::COLLAPSED),
            HostOp::TogglePlaylistPresence => {
                if self.playlist_attached {
                    self.page.document.detach(self.playlist);
                } else {
                    self.page.document.append_child(self.root, self.playlist);
                }
                self.playlist_attached = !self.playlist_attached;
            }
            HostOp::TogglePlaylistCollapsed => self.toggle_attr(self.playlist, host::COLLAPSED),
            HostOp::SelectTab(tab) => self.engine.select_tab(&mut self.page, tab),
            HostOp::Navigate => self.page.finish_navigation(),
        }
    }

    fn root_snapshot(&self) -> Vec<Option<String>> {
        [
            root_attr::TAB,
            root_attr::THEATER,
            root_attr::CHAT,
            root_attr::PLAYLIST,
            root_attr::PANELS,
            root_attr::COLUMNS,
            root_attr::FULLSCREEN,
        ]
        .iter()
        .map(|a| {
            self.page
                .document
                .get_attribute(self.root, a)
                .map(str::to_string)
        })
        .collect()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn arbitrary_host_interleavings_converge(
        ops in prop::collection::vec(op_strategy(), 1..24),
        settle_each in any::<bool>(),
    ) {
        let mut sim = Sim::new();
        for op in &ops {
            sim.apply(*op);
            if settle_each {
                sim.engine.run_until_idle(&mut sim.page);
            }
        }
        sim.engine.run_until_idle(&mut sim.page);

        // Quiescent: another pump consumes nothing.
        prop_assert!(!sim.engine.pump(&mut sim.page));

        // Stable: settling again changes no mirrored attribute.
        let snapshot = sim.root_snapshot();
        sim.engine.run_until_idle(&mut sim.page);
        prop_assert_eq!(sim.root_snapshot(), snapshot);

        // Region arbitration: a selected tab never coexists with an
        // expanded chat or a competing playlist mirror.
        let doc = &sim.page.document;
        let tab = doc.get_attribute(sim.root, root_attr::TAB);
        let chat = doc.get_attribute(sim.root, root_attr::CHAT);
        let playlist = doc.get_attribute(sim.root, root_attr::PLAYLIST);
        if tab.is_some() {
            prop_assert_ne!(chat, Some("+"));
            prop_assert_ne!(playlist, Some("+"));
        }
        prop_assert!(!(chat == Some("+") && playlist == Some("+")));

        // Mirrors track the host booleans they reflect.
        let theater = doc.has_attribute(sim.root, host::THEATER);
        prop_assert_eq!(
            doc.get_attribute(sim.root, root_attr::THEATER),
            theater.then_some("+")
        );
        let two_col = doc.has_attribute(sim.root, host::TWO_COLUMN);
        prop_assert_eq!(
            doc.get_attribute(sim.root, root_attr::COLUMNS),
            Some(if two_col { "2" } else { "1" })
        );
    }

    #[test]
    fn superseded_work_never_writes_to_the_document(
        ops in prop::collection::vec(op_strategy(), 1..24),
    ) {
        let mut sim = Sim::new();
        sim.page.document.set_history(true);

        // Apply ops in small batches so drained bursts supersede each other,
        // then pump round by round and audit the history per round.
        for chunk in ops.chunks(3) {
            for op in chunk {
                sim.apply(*op);
            }
            // Host writes (and the explicit-selection path) happen outside
            // the pump; discard them so the audit sees pump output only.
            sim.page.document.take_history();
            for _ in 0..16 {
                let before = sim.engine.stats();
                sim.engine.pump(&mut sim.page);
                let after = sim.engine.stats();
                let engine_writes = sim
                    .page
                    .document
                    .take_history()
                    .iter()
                    .filter(|r| r.actor == Actor::Engine)
                    .count();
                if after.tasks_executed == before.tasks_executed {
                    prop_assert_eq!(
                        engine_writes,
                        0,
                        "round executed no task (dropped {} stale) yet the engine wrote",
                        after.tasks_dropped_stale - before.tasks_dropped_stale
                    );
                }
            }
        }

        sim.engine.run_until_idle(&mut sim.page);
        prop_assert!(!sim.engine.pump(&mut sim.page));
    }
}
