#![forbid(unsafe_code)]

//! Navigation coordination.
//!
//! # Design
//!
//! The host fires its navigation signal after each SPA route change, often
//! before the new page's root fragment exists. Each signal starts a fresh
//! session: every epoch key is bumped (superseding all in-flight work from
//! the previous page), the fragment registry is dropped, and a bounded
//! retry loop resolves the new page root. The managed container structure is
//! built at most once and reused across navigations for as long as its
//! wrapper stays connected; only a torn-down side column forces a rebuild.
//!
//! # Failure Modes
//!
//! Root resolution gives up after `max_root_retries` attempts and logs a
//! warning. The engine then sits inert until the next navigation signal, the
//! same posture as before the first navigation.

use crate::engine::EngineCx;
use crate::epoch::EpochKey;
use crate::registry::FragmentSlot;
use crate::scheduler::{Task, TaskKind};
use crate::tabs::{self, Containers};
use tracing::{debug, warn};

#[derive(Default)]
pub struct NavigationCoordinator {
    containers: Option<Containers>,
}

impl NavigationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The managed container structure, once built.
    pub fn containers(&self) -> Option<Containers> {
        self.containers
    }

    /// Start a new page session.
    pub(crate) fn begin(&mut self, cx: &mut EngineCx<'_>) {
        debug!("navigation signal; starting a new page session");
        for key in EpochKey::ALL {
            cx.epochs.issue(key);
        }
        cx.slots.clear_all();
        let ticket = cx.epochs.issue(EpochKey::Navigation);
        cx.scheduler.schedule(Task {
            key: EpochKey::Navigation,
            ticket,
            kind: TaskKind::ResolveRoot { attempt: 0 },
            delay: 0,
        });
    }

    /// One root-resolution attempt. Reschedules itself while the root or the
    /// side column is missing, up to the configured retry budget.
    pub(crate) fn resolve_root(&mut self, cx: &mut EngineCx<'_>, attempt: u32) {
        let doc_root = cx.doc.root();
        let root = cx.config.page_root_selector.query(cx.doc, doc_root);
        let side = root.and_then(|r| cx.config.side_column_selector.query(cx.doc, r));
        let (Some(root), Some(side_column)) = (root, side) else {
            if attempt + 1 >= cx.config.max_root_retries {
                warn!(attempt, "page root never appeared; idle until next navigation");
                return;
            }
            let ticket = cx.epochs.issue(EpochKey::Navigation);
            cx.scheduler.schedule(Task {
                key: EpochKey::Navigation,
                ticket,
                kind: TaskKind::ResolveRoot {
                    attempt: attempt + 1,
                },
                delay: cx.config.retry_delay_ticks,
            });
            return;
        };

        debug!(?root, attempt, "page root resolved");
        cx.slots.set(FragmentSlot::PageRoot, Some(root));

        let rebuild = match self.containers {
            Some(c) => !(cx.doc.is_alive(c.wrapper) && cx.doc.is_connected(c.wrapper)),
            None => true,
        };
        if rebuild {
            // A prior engine instance (or a teardown) may have left the
            // structure in place; reuse it rather than nesting a second one.
            self.containers = Some(
                tabs::find_containers(cx.doc, side_column)
                    .unwrap_or_else(|| tabs::insert_containers(cx.doc, side_column)),
            );
        }

        // Fragments that attached before the root resolved are already bound;
        // move them into their content containers now.
        if let Some(containers) = self.containers {
            for slot in FragmentSlot::ALL {
                if let Some(node) = cx.slots.get(slot, cx.doc) {
                    if let Err(err) = tabs::place_fragment(cx.doc, &containers, slot, node) {
                        cx.stats.reparent_failures += 1;
                        warn!(%err, ?slot, "placement after root resolution failed");
                    }
                }
            }
        }

        let ticket = cx.epochs.issue(EpochKey::Reconcile);
        cx.scheduler.schedule(Task {
            key: EpochKey::Reconcile,
            ticket,
            kind: TaskKind::Reconcile,
            delay: 0,
        });
    }

    /// Drop the container handles. Run on engine teardown.
    pub(crate) fn reset(&mut self) {
        self.containers = None;
    }
}
