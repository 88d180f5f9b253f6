#![forbid(unsafe_code)]

//! Attribute change observers.
//!
//! Each observer watches one registered fragment (or, for engagement panels,
//! every node of a tag) for a small attribute allow-list. A matching mutation
//! never acts inline: it names the scheduled task and the epoch key to issue
//! a fresh ticket under, so a burst of host mutations collapses into a single
//! logical reconciliation — every ticket but the last goes stale in the
//! queue.
//!
//! Engine-tagged child-list records are skipped (our own reparenting must not
//! re-trigger reconciliation), but engine-tagged *attribute* records are
//! observed like any other: corrective writes feeding back through observers
//! is exactly how the state machine converges pass by pass. Termination comes
//! from no-op attribute writes recording nothing.
//!
//! Host-tagged child-list records get one extra check: a splice whose target
//! now holds a relocatable bound fragment may have moved that fragment
//! between two connected parents — a move that fires no lifecycle event and
//! changes no attribute. Such records schedule a placement fixup.

use crate::config::EngineConfig;
use crate::contract::{host, root_attr};
use crate::epoch::EpochKey;
use crate::registry::{FragmentSlot, SlotTable};
use crate::scheduler::TaskKind;
use crate::tabs;
use tabweld_host::{Actor, Document, MutationKind, MutationRecord, NodeId};

/// What one observer watches.
#[derive(Clone, Copy, Debug)]
enum ObserverTarget {
    Slot(FragmentSlot),
    EngagementPanels,
}

#[derive(Clone, Copy, Debug)]
struct ObserverSpec {
    target: ObserverTarget,
    attrs: &'static [&'static str],
    key: EpochKey,
    task: TaskKind,
}

/// The fixed observer set. All panel-state observers share the reconcile
/// epoch key, so any burst across fragments coalesces into one pass.
static OBSERVERS: &[ObserverSpec] = &[
    ObserverSpec {
        target: ObserverTarget::Slot(FragmentSlot::Chat),
        attrs: &[host::COLLAPSED, host::HIDDEN],
        key: EpochKey::Reconcile,
        task: TaskKind::Reconcile,
    },
    ObserverSpec {
        target: ObserverTarget::Slot(FragmentSlot::Playlist),
        attrs: &[host::COLLAPSED, host::HIDDEN],
        key: EpochKey::Reconcile,
        task: TaskKind::Reconcile,
    },
    ObserverSpec {
        target: ObserverTarget::Slot(FragmentSlot::PageRoot),
        attrs: &[
            host::THEATER,
            host::FULLSCREEN,
            host::TWO_COLUMN,
            root_attr::TAB,
        ],
        key: EpochKey::Reconcile,
        task: TaskKind::Reconcile,
    },
    ObserverSpec {
        target: ObserverTarget::EngagementPanels,
        attrs: &[host::VISIBILITY, host::TARGET_ID],
        key: EpochKey::Reconcile,
        task: TaskKind::Reconcile,
    },
];

/// Match one drained mutation record against the observer set.
///
/// Returns the `(epoch key, task)` to schedule, or `None` when no observer
/// cares. Plugin attributes from the config are folded into the page-root
/// observer's allow-list.
pub fn match_record(
    rec: &MutationRecord,
    doc: &Document,
    slots: &mut SlotTable,
    config: &EngineConfig,
) -> Option<(EpochKey, TaskKind)> {
    let name = match &rec.kind {
        MutationKind::Attribute { name, .. } => name.as_str(),
        // Connectivity flips are covered by lifecycle hooks, and the
        // engine's own splices must not feed back. What remains is a host
        // move between two connected parents: no lifecycle event, no
        // attribute record, just the insertion splice at the new parent.
        MutationKind::ChildList => {
            if rec.actor == Actor::Host && holds_relocatable_fragment(rec.target, doc, slots) {
                return Some((EpochKey::LayoutFixup, TaskKind::LayoutFixup));
            }
            return None;
        }
    };
    for spec in OBSERVERS {
        let target_matches = match spec.target {
            ObserverTarget::Slot(slot) => slots.get(slot, doc) == Some(rec.target),
            ObserverTarget::EngagementPanels => {
                doc.tag(rec.target) == Some(config.engagement_panel_tag.as_str())
            }
        };
        if !target_matches {
            continue;
        }
        let attr_matches = spec.attrs.contains(&name)
            || (matches!(spec.target, ObserverTarget::Slot(FragmentSlot::PageRoot))
                && config.plugin_attributes.iter().any(|a| a == name));
        if attr_matches {
            return Some((spec.key, spec.task));
        }
    }
    None
}

/// Whether any bound fragment with a home container currently sits under
/// `parent`. Used to spot host splices that pulled a placed fragment out of
/// its container.
fn holds_relocatable_fragment(parent: NodeId, doc: &Document, slots: &mut SlotTable) -> bool {
    FragmentSlot::ALL.into_iter().any(|slot| {
        tabs::home_tab(slot).is_some()
            && slots
                .get(slot, doc)
                .is_some_and(|n| doc.parent(n) == Some(parent))
    })
}
