#![forbid(unsafe_code)]

//! The engine pump: event intake, staleness-checked task execution, and the
//! public control surface.
//!
//! # Design
//!
//! All engine state lives in one [`Engine`] value; there are no globals and
//! no hidden channels, so tests construct as many independent engines as
//! they like. A [`pump`] call is one deterministic round: complete deferred
//! hook installs, fold navigation signals, drain the host's lifecycle and
//! mutation queues into scheduled tasks, then execute the currently due
//! batch. Every task re-checks its captured ticket before producing effects;
//! superseded tasks are counted and dropped.
//!
//! [`run_until_idle`] pumps until a round makes no progress with an empty
//! queue, under a configured round budget. Hosts that keep mutating never
//! starve the loop; the budget turns a livelock into a logged warning.
//!
//! [`pump`]: Engine::pump
//! [`run_until_idle`]: Engine::run_until_idle

use crate::config::EngineConfig;
use crate::contract::{TabId, host, root_attr};
use crate::epoch::{EpochKey, EpochTable};
use crate::hooks::{HookInstaller, HookReaction};
use crate::navigation::NavigationCoordinator;
use crate::observers;
use crate::panel_state::{PanelOwner, PanelState};
use crate::registry::{FragmentSlot, SlotTable};
use crate::scheduler::{Scheduler, Task, TaskKind};
use crate::tabs;
use tabweld_host::{ClassRegistry, Document, HostPage, NodeId};
use tracing::{debug, trace, warn};

/// Counters for observability and test assertions.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct EngineStats {
    pub tasks_executed: u64,
    pub tasks_dropped_stale: u64,
    pub corrective_actions: u64,
    pub reparent_failures: u64,
    pub hook_install_failures: u64,
    pub reconcile_passes: u64,
}

/// One borrow of everything a subsystem needs during a pump round.
pub(crate) struct EngineCx<'a> {
    pub doc: &'a mut Document,
    pub slots: &'a mut SlotTable,
    pub epochs: &'a mut EpochTable,
    pub scheduler: &'a mut Scheduler,
    pub config: &'a EngineConfig,
    pub stats: &'a mut EngineStats,
}

macro_rules! engine_cx {
    ($self:ident, $doc:expr) => {
        EngineCx {
            doc: $doc,
            slots: &mut $self.slots,
            epochs: &mut $self.epochs,
            scheduler: &mut $self.scheduler,
            config: &$self.config,
            stats: &mut $self.stats,
        }
    };
}

pub struct Engine {
    config: EngineConfig,
    epochs: EpochTable,
    slots: SlotTable,
    scheduler: Scheduler,
    hooks: HookInstaller,
    panels: PanelState,
    nav: NavigationCoordinator,
    stats: EngineStats,
    hooks_installed: bool,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            epochs: EpochTable::new(),
            slots: SlotTable::new(),
            scheduler: Scheduler::new(),
            hooks: HookInstaller::new(),
            panels: PanelState::new(),
            nav: NavigationCoordinator::new(),
            stats: EngineStats::default(),
            hooks_installed: false,
        }
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// The tab currently recorded on the page root, if any.
    pub fn active_tab(&mut self, page: &HostPage) -> Option<TabId> {
        let root = self.slots.get(FragmentSlot::PageRoot, &page.document)?;
        tabs::active_tab(&page.document, root)
    }

    pub fn last_panel(&self) -> PanelOwner {
        self.panels.last_panel()
    }

    /// One deterministic round. Returns whether any event was consumed or
    /// any task executed.
    pub fn pump(&mut self, page: &mut HostPage) -> bool {
        if !self.hooks_installed {
            self.install_hooks(&page.classes);
            self.hooks_installed = true;
        }
        self.hooks.complete_pending(&page.classes);

        let mut progressed = false;

        // Multiple queued signals collapse into one: only the newest page
        // session can matter.
        if page.take_navigations() > 0 {
            progressed = true;
            self.panels.reset();
            let mut cx = engine_cx!(self, &mut page.document);
            self.nav.begin(&mut cx);
        }

        for ev in page.document.drain_lifecycle() {
            progressed = true;
            for reaction in self.hooks.route(&ev) {
                let key = reaction.epoch_key();
                let ticket = self.epochs.issue(key);
                let kind = match reaction {
                    HookReaction::BindSlot(slot) => TaskKind::BindSlot { slot, node: ev.node },
                    HookReaction::ClearSlot(slot) => TaskKind::ClearSlot { slot },
                    HookReaction::Reconcile => TaskKind::Reconcile,
                };
                self.scheduler.schedule(Task {
                    key,
                    ticket,
                    kind,
                    delay: 0,
                });
            }
        }

        for rec in page.document.drain_mutations() {
            progressed = true;
            if let Some((key, kind)) =
                observers::match_record(&rec, &page.document, &mut self.slots, &self.config)
            {
                let ticket = self.epochs.issue(key);
                self.scheduler.schedule(Task {
                    key,
                    ticket,
                    kind,
                    delay: 0,
                });
            }
        }

        for task in self.scheduler.take_due() {
            if !self.epochs.is_current(task.key, task.ticket) {
                self.stats.tasks_dropped_stale += 1;
                trace!(key = ?task.key, ticket = task.ticket, "dropping superseded task");
                continue;
            }
            progressed = true;
            self.stats.tasks_executed += 1;
            self.execute(task.kind, page);
        }

        progressed
    }

    /// Pump until quiescent or the round budget runs out.
    pub fn run_until_idle(&mut self, page: &mut HostPage) {
        for _ in 0..self.config.max_idle_rounds {
            let progressed = self.pump(page);
            if !progressed && self.scheduler.is_idle() {
                return;
            }
        }
        warn!(
            budget = self.config.max_idle_rounds,
            "round budget exhausted before quiescence"
        );
    }

    /// Explicitly select a tab (or none). The attribute write flows back
    /// through the page-root observer, so reconciliation follows on the next
    /// pump like any host-driven change.
    pub fn select_tab(&mut self, page: &mut HostPage, tab: Option<TabId>) {
        let Some(root) = self.slots.get(FragmentSlot::PageRoot, &page.document) else {
            warn!("tab selection before the page root resolved; ignoring");
            return;
        };
        let previous = tabs::active_tab(&page.document, root);
        debug!(?tab, ?previous, "explicit tab selection");
        {
            let mut doc = page.document.as_engine();
            match tab {
                Some(t) => doc.set_attribute(root, root_attr::TAB, t.as_str()),
                None => doc.remove_attribute(root, root_attr::TAB),
            }
        }
        // Leaving the playlist tab collapses the panel it was showing;
        // entering it opens the panel.
        if previous == Some(TabId::Playlist) && tab != Some(TabId::Playlist) {
            if let Some(playlist) = self.slots.get(FragmentSlot::Playlist, &page.document) {
                page.document
                    .as_engine()
                    .set_attribute(playlist, host::COLLAPSED, "");
            }
        }
        if let Some(t) = tab {
            self.panels.last_tab = Some(t);
            self.panels.last_panel = PanelOwner::Tab(t);
            if t == TabId::Playlist {
                if let Some(playlist) = self.slots.get(FragmentSlot::Playlist, &page.document) {
                    let mut doc = page.document.as_engine();
                    doc.remove_attribute(playlist, host::COLLAPSED);
                    doc.remove_attribute(playlist, host::HIDDEN);
                }
            }
        }
        let ticket = self.epochs.issue(EpochKey::CommentsFixup);
        self.scheduler.schedule(Task {
            key: EpochKey::CommentsFixup,
            ticket,
            kind: TaskKind::CommentsFixup,
            delay: 0,
        });
    }

    /// Drop all engine state for the page. Hook markers persist (there is no
    /// uninstall); re-installation after teardown is a no-op.
    pub fn teardown(&mut self) {
        debug!("engine teardown");
        self.scheduler.clear();
        self.slots.clear_all();
        self.panels.reset();
        self.nav.reset();
    }

    fn install_hooks(&mut self, classes: &ClassRegistry) {
        for spec in self.config.hooks.clone() {
            if let Err(err) = self.hooks.install(classes, spec) {
                self.stats.hook_install_failures += 1;
                warn!(%err, "failed to install lifecycle hook");
            }
        }
    }

    fn execute(&mut self, kind: TaskKind, page: &mut HostPage) {
        match kind {
            TaskKind::BindSlot { slot, node } => self.bind_slot(slot, node, &mut page.document),
            TaskKind::ClearSlot { slot } => {
                trace!(?slot, "clearing fragment slot");
                self.slots.invalidate(slot);
            }
            TaskKind::Reconcile => {
                let mut cx = engine_cx!(self, &mut page.document);
                self.panels.reconcile(&mut cx);
            }
            TaskKind::ResolveRoot { attempt } => {
                let mut cx = engine_cx!(self, &mut page.document);
                self.nav.resolve_root(&mut cx, attempt);
            }
            TaskKind::LayoutFixup => self.layout_fixup(&mut page.document),
            TaskKind::CommentsFixup => self.comments_fixup(&mut page.document),
        }
    }

    fn bind_slot(&mut self, slot: FragmentSlot, node: NodeId, doc: &mut Document) {
        // The attach notification may have been outrun by a detach or a
        // destroy; a stale handle is simply ignored.
        if !doc.is_alive(node) || !doc.is_connected(node) {
            trace!(?slot, "attach notification outlived its node; ignoring");
            return;
        }
        debug!(?slot, ?node, "binding fragment slot");
        self.slots.set(slot, Some(node));
        if let Some(containers) = self.nav.containers() {
            if let Err(err) = tabs::place_fragment(doc, &containers, slot, node) {
                self.stats.reparent_failures += 1;
                warn!(%err, ?slot, "failed to place freshly bound fragment");
            }
        }
    }

    /// Re-assert fragment placement after a layout flip.
    fn layout_fixup(&mut self, doc: &mut Document) {
        let Some(containers) = self.nav.containers() else {
            return;
        };
        for slot in FragmentSlot::ALL {
            if let Some(node) = self.slots.get(slot, doc) {
                if let Err(err) = tabs::place_fragment(doc, &containers, slot, node) {
                    self.stats.reparent_failures += 1;
                    warn!(%err, ?slot, "placement fixup failed");
                }
            }
        }
    }

    /// Keep the comments fragment's host visibility in line with the active
    /// tab, so its lazy content loader only runs while actually shown.
    fn comments_fixup(&mut self, doc: &mut Document) {
        let Some(comments) = self.slots.get(FragmentSlot::Comments, doc) else {
            return;
        };
        let Some(root) = self.slots.get(FragmentSlot::PageRoot, doc) else {
            return;
        };
        let active = tabs::active_tab(doc, root);
        let mut doc = doc.as_engine();
        if active == Some(TabId::Comments) {
            doc.remove_attribute(comments, host::HIDDEN);
        } else {
            doc.set_attribute(comments, host::HIDDEN, "");
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
