#![forbid(unsafe_code)]

//! The tab/panel state machine.
//!
//! # Design
//!
//! Each reconciliation pass recomputes the [`UiFlags`] snapshot `q` from live
//! predicates, diffs it against the previous snapshot `p`, and applies every
//! matching rule from the declarative table, in priority order. Corrective
//! actions only mutate document attributes; they never re-run the machine
//! synchronously. The resulting mutation records flow back through the
//! change observers and schedule the *next* pass, so the machine is
//! eventually consistent instead of recursively resolved — bounded work per
//! call stack, convergence because no-op writes record nothing.
//!
//! `LastTab` is the restoration target when a competing panel is dismissed;
//! `LastPanel` records which surface currently owns the contested screen
//! region. Both persist across passes and reset on navigation.

use crate::contract::{TabId, host, root_attr};
use crate::engine::EngineCx;
use crate::epoch::EpochKey;
use crate::flags::{self, UiFlags};
use crate::registry::FragmentSlot;
use crate::rules::{self, Corrective};
use crate::scheduler::{Task, TaskKind};
use crate::tabs;
use tabweld_host::{Document, NodeId};
use tracing::{debug, trace};

/// Which surface currently owns the contested screen region.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PanelOwner {
    #[default]
    None,
    Chat,
    Playlist,
    Tab(TabId),
}

#[derive(Debug, Default)]
pub struct PanelState {
    prev: UiFlags,
    pub(crate) last_tab: Option<TabId>,
    pub(crate) last_panel: PanelOwner,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything; run on navigation.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn last_tab(&self) -> Option<TabId> {
        self.last_tab
    }

    pub fn last_panel(&self) -> PanelOwner {
        self.last_panel
    }

    /// One reconciliation pass.
    pub(crate) fn reconcile(&mut self, cx: &mut EngineCx<'_>) {
        cx.stats.reconcile_passes += 1;
        let q = flags::compute(cx.doc, cx.slots, cx.config);
        let p = std::mem::replace(&mut self.prev, q);
        let Some(root) = cx.slots.get(FragmentSlot::PageRoot, cx.doc) else {
            trace!("no page root bound; reconciliation inactive");
            return;
        };
        let tab_before = tabs::active_tab(cx.doc, root);
        trace!(?p, ?q, "reconcile pass");

        // External plugin overrides take priority over every normal rule.
        if q.contains(UiFlags::PLUGIN_ACTIVE) {
            debug!("external plugin active; surrendering the managed tab");
            if q.contains(UiFlags::TAB_SELECTED) {
                cx.stats.corrective_actions += 1;
                cx.doc.as_engine().remove_attribute(root, root_attr::TAB);
            }
            self.finish_pass(cx, root, tab_before);
            return;
        }

        for rule in rules::evaluate(p, q) {
            debug!(rule = rule.name, action = ?rule.action, "transition rule fired");
            self.apply(cx, root, rule.action);
        }

        self.check_vanished_owner(cx, root, p, q);

        if (p ^ q).contains(UiFlags::TWO_COLUMN) {
            debug!("column layout flipped; scheduling fixups");
            let ticket = cx.epochs.issue(EpochKey::LayoutFixup);
            cx.scheduler.schedule(Task {
                key: EpochKey::LayoutFixup,
                ticket,
                kind: TaskKind::LayoutFixup,
                delay: cx.config.settle_delay_ticks,
            });
            let ticket = cx.epochs.issue(EpochKey::CommentsFixup);
            cx.scheduler.schedule(Task {
                key: EpochKey::CommentsFixup,
                ticket,
                kind: TaskKind::CommentsFixup,
                delay: cx.config.settle_delay_ticks,
            });
        }

        self.finish_pass(cx, root, tab_before);
    }

    /// Mirror writes, owner bookkeeping, and the comments follow-up shared by
    /// the normal and plugin paths.
    fn finish_pass(&mut self, cx: &mut EngineCx<'_>, root: NodeId, tab_before: Option<TabId>) {
        let fq = flags::compute(cx.doc, cx.slots, cx.config);
        self.write_mirrors(cx, root, fq);
        let active = tabs::active_tab(cx.doc, root);
        self.update_owner(fq, active);
        if active != tab_before {
            let ticket = cx.epochs.issue(EpochKey::CommentsFixup);
            cx.scheduler.schedule(Task {
                key: EpochKey::CommentsFixup,
                ticket,
                kind: TaskKind::CommentsFixup,
                delay: 0,
            });
        }
    }

    fn apply(&mut self, cx: &mut EngineCx<'_>, root: NodeId, action: Corrective) {
        cx.stats.corrective_actions += 1;
        match action {
            Corrective::SwitchToNoTab => {
                cx.doc.as_engine().remove_attribute(root, root_attr::TAB);
            }
            Corrective::SwitchToLastTab => match self.last_tab {
                Some(tab) => {
                    cx.doc
                        .as_engine()
                        .set_attribute(root, root_attr::TAB, tab.as_str());
                }
                None => self.initial_fixup(cx),
            },
            Corrective::ExpandChat => {
                if let Some(chat) = cx.slots.get(FragmentSlot::Chat, cx.doc) {
                    cx.doc.as_engine().remove_attribute(chat, host::COLLAPSED);
                }
            }
            Corrective::CollapseChat => {
                if let Some(chat) = cx.slots.get(FragmentSlot::Chat, cx.doc) {
                    cx.doc.as_engine().set_attribute(chat, host::COLLAPSED, "");
                }
            }
            Corrective::OpenPlaylist => {
                if let Some(playlist) = cx.slots.get(FragmentSlot::Playlist, cx.doc) {
                    let mut doc = cx.doc.as_engine();
                    doc.remove_attribute(playlist, host::COLLAPSED);
                    doc.remove_attribute(playlist, host::HIDDEN);
                }
            }
            Corrective::ClosePlaylist => {
                if let Some(playlist) = cx.slots.get(FragmentSlot::Playlist, cx.doc) {
                    cx.doc
                        .as_engine()
                        .set_attribute(playlist, host::COLLAPSED, "");
                }
            }
            Corrective::CancelTheater => {
                cx.doc.as_engine().remove_attribute(root, host::THEATER);
            }
            Corrective::CloseEngagementPanels => {
                let panels =
                    flags::expanded_engagement_panels(cx.doc, root, &cx.config.engagement_panel_tag);
                let mut doc = cx.doc.as_engine();
                for panel in panels {
                    doc.set_attribute(panel, host::VISIBILITY, host::VISIBILITY_HIDDEN);
                }
            }
        }
    }

    /// The recorded owner disappeared out from under us.
    fn check_vanished_owner(&mut self, cx: &mut EngineCx<'_>, root: NodeId, p: UiFlags, q: UiFlags) {
        let vanished = match self.last_panel {
            PanelOwner::Chat => {
                p.contains(UiFlags::CHAT_EXPANDED) && !q.contains(UiFlags::CHAT_EXPANDED)
            }
            PanelOwner::Playlist => {
                p.contains(UiFlags::PLAYLIST_EXPANDED) && !q.contains(UiFlags::PLAYLIST_EXPANDED)
            }
            PanelOwner::None | PanelOwner::Tab(_) => false,
        };
        if vanished && !q.contains(UiFlags::TAB_SELECTED) && !q.contains(UiFlags::FULLSCREEN) {
            debug!(owner = ?self.last_panel, "panel owner vanished; restoring last tab");
            self.apply(cx, root, Corrective::SwitchToLastTab);
        }
    }

    /// Decide the startup owner when no tab was ever explicitly chosen:
    /// whichever space-competing panel the host already shows, chat first.
    fn initial_fixup(&mut self, cx: &mut EngineCx<'_>) {
        let fq = flags::compute(cx.doc, cx.slots, cx.config);
        self.last_panel = if fq.contains(UiFlags::CHAT_EXPANDED) {
            PanelOwner::Chat
        } else if fq.contains(UiFlags::PLAYLIST_EXPANDED) {
            PanelOwner::Playlist
        } else {
            PanelOwner::None
        };
        debug!(owner = ?self.last_panel, "initial state fixup");
    }

    /// Expose the snapshot to styling via root attributes.
    fn write_mirrors(&self, cx: &mut EngineCx<'_>, root: NodeId, fq: UiFlags) {
        let playlist_present = cx.slots.get(FragmentSlot::Playlist, cx.doc).is_some();
        let chat_present = cx.slots.get(FragmentSlot::Chat, cx.doc).is_some();
        let mut doc = cx.doc.as_engine();
        set_or_remove(
            &mut doc,
            root,
            root_attr::THEATER,
            fq.contains(UiFlags::THEATER).then_some("+"),
        );
        set_or_remove(
            &mut doc,
            root,
            root_attr::FULLSCREEN,
            fq.contains(UiFlags::FULLSCREEN).then_some("+"),
        );
        let chat = if fq.contains(UiFlags::CHAT_EXPANDED) {
            Some("+")
        } else if chat_present {
            Some("-")
        } else {
            None
        };
        set_or_remove(&mut doc, root, root_attr::CHAT, chat);
        let playlist = if fq.contains(UiFlags::PLAYLIST_EXPANDED) {
            Some("+")
        } else if playlist_present {
            Some("-")
        } else {
            None
        };
        set_or_remove(&mut doc, root, root_attr::PLAYLIST, playlist);
        set_or_remove(
            &mut doc,
            root,
            root_attr::PANELS,
            fq.contains(UiFlags::PANEL_EXPANDED).then_some("+"),
        );
        let columns = if fq.contains(UiFlags::TWO_COLUMN) {
            "2"
        } else {
            "1"
        };
        doc.set_attribute(root, root_attr::COLUMNS, columns);
    }

    fn update_owner(&mut self, fq: UiFlags, active: Option<TabId>) {
        if let Some(tab) = active {
            self.last_panel = PanelOwner::Tab(tab);
        } else if fq.contains(UiFlags::CHAT_EXPANDED) {
            self.last_panel = PanelOwner::Chat;
        } else if fq.contains(UiFlags::PLAYLIST_EXPANDED) {
            self.last_panel = PanelOwner::Playlist;
        }
        // When nothing owns the region, keep the record: it is the
        // restoration breadcrumb for the next dismissal.
    }
}

fn set_or_remove(doc: &mut Document, node: NodeId, name: &str, value: Option<&str>) {
    match value {
        Some(v) => doc.set_attribute(node, name, v),
        None => doc.remove_attribute(node, name),
    }
}
