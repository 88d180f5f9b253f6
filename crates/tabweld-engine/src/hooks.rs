#![forbid(unsafe_code)]

//! Lifecycle hook installation and routing.
//!
//! # Design
//!
//! The engine never patches host internals directly; it subscribes to the
//! host's lifecycle event stream through this installer, one hook per
//! component class. Installation is idempotent — a per-class marker prevents
//! double-wiring when navigation re-runs setup — and deferred: a hook for a
//! class the host has not defined yet is parked and completed once the class
//! registry reports it defined. Later redefinitions do not re-install.
//!
//! The host always runs its own lifecycle behavior first (events are drained,
//! never delivered re-entrantly), and hook reactions are *scheduled*, not
//! applied inline, so the host's bookkeeping for a lifecycle call completes
//! before the engine acts on it. There is no uninstall.
//!
//! Engine-caused lifecycle events (re-entrancy marker set during
//! reparenting) are skipped here: the registry self-heals on read, so
//! reacting to our own moves would only schedule redundant reconciliation.

use crate::epoch::EpochKey;
use crate::registry::FragmentSlot;
use ahash::AHashMap;
use std::fmt;
use tabweld_host::{Actor, ClassRegistry, LifecycleEvent, LifecyclePhase};
use tracing::{debug, trace};

/// Which lifecycle phases a hook intercepts and which slot it feeds.
#[derive(Clone, Debug)]
pub struct HookSpec {
    pub class: String,
    /// Slot bound on attach and cleared on detach, when present.
    pub slot: Option<FragmentSlot>,
    pub on_attached: bool,
    pub on_detached: bool,
    pub on_data_changed: bool,
}

impl HookSpec {
    /// Hook all three phases for a relocatable fragment class.
    pub fn fragment(class: impl Into<String>, slot: FragmentSlot) -> Self {
        Self {
            class: class.into(),
            slot: Some(slot),
            on_attached: true,
            on_detached: true,
            on_data_changed: true,
        }
    }

    /// Hook only data-change notifications (no slot binding).
    pub fn data_only(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            slot: None,
            on_attached: false,
            on_detached: false,
            on_data_changed: true,
        }
    }

    fn handles(&self, phase: LifecyclePhase) -> bool {
        match phase {
            LifecyclePhase::Attached => self.on_attached,
            LifecyclePhase::Detached => self.on_detached,
            LifecyclePhase::DataChanged => self.on_data_changed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HookError {
    /// The spec intercepts no phase at all.
    NothingToHook { class: String },
    /// The spec names an empty class.
    EmptyClass,
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingToHook { class } => {
                write!(f, "hook for class `{class}` intercepts no lifecycle phase")
            }
            Self::EmptyClass => write!(f, "hook class name is empty"),
        }
    }
}

/// A scheduled reaction produced by routing one lifecycle event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookReaction {
    BindSlot(FragmentSlot),
    ClearSlot(FragmentSlot),
    Reconcile,
}

impl HookReaction {
    /// The epoch key the reaction's task is guarded by.
    pub fn epoch_key(self) -> EpochKey {
        match self {
            Self::BindSlot(slot) | Self::ClearSlot(slot) => slot.epoch_key(),
            Self::Reconcile => EpochKey::Reconcile,
        }
    }
}

#[derive(Default)]
pub struct HookInstaller {
    installed: AHashMap<String, HookSpec>,
    pending: Vec<HookSpec>,
    delivered: AHashMap<(String, LifecyclePhase), u64>,
}

impl HookInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a hook, or park it until the class is defined. Calling twice
    /// for the same class is a no-op.
    pub fn install(&mut self, registry: &ClassRegistry, spec: HookSpec) -> Result<(), HookError> {
        if spec.class.is_empty() {
            return Err(HookError::EmptyClass);
        }
        if !spec.on_attached && !spec.on_detached && !spec.on_data_changed {
            return Err(HookError::NothingToHook { class: spec.class });
        }
        if self.is_installed(&spec.class) || self.pending.iter().any(|p| p.class == spec.class) {
            trace!(class = %spec.class, "hook already installed; skipping");
            return Ok(());
        }
        if registry.is_defined(&spec.class) {
            debug!(class = %spec.class, "installing lifecycle hook");
            self.installed.insert(spec.class.clone(), spec);
        } else {
            trace!(class = %spec.class, "class not yet defined; parking hook");
            self.pending.push(spec);
        }
        Ok(())
    }

    /// Complete parked installs whose classes have since been defined.
    pub fn complete_pending(&mut self, registry: &ClassRegistry) {
        let mut still_pending = Vec::new();
        for spec in self.pending.drain(..) {
            if registry.is_defined(&spec.class) {
                if self.installed.contains_key(&spec.class) {
                    continue;
                }
                debug!(class = %spec.class, "installing deferred lifecycle hook");
                self.installed.insert(spec.class.clone(), spec);
            } else {
                still_pending.push(spec);
            }
        }
        self.pending = still_pending;
    }

    pub fn is_installed(&self, class: &str) -> bool {
        self.installed.contains_key(class)
    }

    /// Route one drained lifecycle event to its hook reactions.
    pub fn route(&mut self, ev: &LifecycleEvent) -> Vec<HookReaction> {
        if ev.actor == Actor::Engine {
            trace!(kind = %ev.kind, phase = ?ev.phase, "skipping self-inflicted lifecycle event");
            return Vec::new();
        }
        let Some(spec) = self.installed.get(&ev.kind) else {
            return Vec::new();
        };
        if !spec.handles(ev.phase) {
            return Vec::new();
        }
        *self
            .delivered
            .entry((ev.kind.clone(), ev.phase))
            .or_insert(0) += 1;

        let mut reactions = Vec::new();
        match ev.phase {
            LifecyclePhase::Attached => {
                if let Some(slot) = spec.slot {
                    reactions.push(HookReaction::BindSlot(slot));
                }
                reactions.push(HookReaction::Reconcile);
            }
            LifecyclePhase::Detached => {
                if let Some(slot) = spec.slot {
                    reactions.push(HookReaction::ClearSlot(slot));
                }
                reactions.push(HookReaction::Reconcile);
            }
            LifecyclePhase::DataChanged => {
                reactions.push(HookReaction::Reconcile);
            }
        }
        reactions
    }

    /// How many events this installer delivered for `(class, phase)`.
    /// Compared against `Document::dispatch_count` to prove single wiring.
    pub fn delivered_count(&self, class: &str, phase: LifecyclePhase) -> u64 {
        self.delivered
            .get(&(class.to_string(), phase))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabweld_host::NodeId;

    fn attach_event(kind: &str) -> LifecycleEvent {
        LifecycleEvent {
            node: dummy_node(),
            kind: kind.to_string(),
            phase: LifecyclePhase::Attached,
            actor: Actor::Host,
        }
    }

    fn dummy_node() -> NodeId {
        let mut doc = tabweld_host::Document::new();
        doc.create_element("x")
    }

    #[test]
    fn double_install_is_a_no_op() {
        let mut reg = ClassRegistry::new();
        reg.define("live-chat");
        let mut hooks = HookInstaller::new();
        hooks
            .install(&reg, HookSpec::fragment("live-chat", FragmentSlot::Chat))
            .unwrap();
        hooks
            .install(&reg, HookSpec::fragment("live-chat", FragmentSlot::Chat))
            .unwrap();

        // A single host dispatch yields a single delivery.
        let ev = attach_event("live-chat");
        let reactions = hooks.route(&ev);
        assert_eq!(reactions.len(), 2);
        assert_eq!(hooks.delivered_count("live-chat", LifecyclePhase::Attached), 1);
    }

    #[test]
    fn install_parks_until_class_defined() {
        let mut reg = ClassRegistry::new();
        let mut hooks = HookInstaller::new();
        hooks
            .install(&reg, HookSpec::fragment("playlist-panel", FragmentSlot::Playlist))
            .unwrap();
        assert!(!hooks.is_installed("playlist-panel"));
        assert!(hooks.route(&attach_event("playlist-panel")).is_empty());

        reg.define("playlist-panel");
        hooks.complete_pending(&reg);
        assert!(hooks.is_installed("playlist-panel"));
        assert!(!hooks.route(&attach_event("playlist-panel")).is_empty());
    }

    #[test]
    fn parked_duplicate_does_not_install_twice() {
        let mut reg = ClassRegistry::new();
        let mut hooks = HookInstaller::new();
        let spec = HookSpec::fragment("related-list", FragmentSlot::Related);
        hooks.install(&reg, spec.clone()).unwrap();
        hooks.install(&reg, spec).unwrap();
        reg.define("related-list");
        hooks.complete_pending(&reg);
        hooks.route(&attach_event("related-list"));
        assert_eq!(
            hooks.delivered_count("related-list", LifecyclePhase::Attached),
            1
        );
    }

    #[test]
    fn engine_actored_events_are_skipped() {
        let mut reg = ClassRegistry::new();
        reg.define("live-chat");
        let mut hooks = HookInstaller::new();
        hooks
            .install(&reg, HookSpec::fragment("live-chat", FragmentSlot::Chat))
            .unwrap();
        let mut ev = attach_event("live-chat");
        ev.actor = Actor::Engine;
        assert!(hooks.route(&ev).is_empty());
        assert_eq!(hooks.delivered_count("live-chat", LifecyclePhase::Attached), 0);
    }

    #[test]
    fn invalid_specs_are_rejected() {
        let reg = ClassRegistry::new();
        let mut hooks = HookInstaller::new();
        assert_eq!(
            hooks.install(&reg, HookSpec::data_only("")),
            Err(HookError::EmptyClass)
        );
        let mut spec = HookSpec::data_only("watch-page");
        spec.on_data_changed = false;
        assert!(matches!(
            hooks.install(&reg, spec),
            Err(HookError::NothingToHook { .. })
        ));
    }
}
