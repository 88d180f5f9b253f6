#![forbid(unsafe_code)]

//! Arena-backed document tree.
//!
//! # Design
//!
//! Nodes live in a slab with a free list; a [`NodeId`] carries the slot index
//! plus the slot's generation at allocation time, so a handle to a destroyed
//! node can never resolve to the node that later reuses the slot. This is the
//! deterministic replacement for weak references: readers re-validate
//! liveness and connectivity instead of waiting for garbage collection.
//!
//! Every mutation appends a [`MutationRecord`] tagged with the current
//! [`Actor`], and every connectivity change of a component-bound node emits a
//! [`LifecycleEvent`]. Both streams are drained by the consumer (the engine),
//! never delivered re-entrantly, so host bookkeeping for a mutation always
//! completes before anyone reacts to it.
//!
//! # Invariants
//!
//! 1. A live node has exactly one parent or none; a node appears at most once
//!    in any child list.
//! 2. `is_connected(n)` holds iff `n` is reachable from `root()` by parent
//!    links.
//! 3. Setting an attribute to its current value is a no-op: no record, no
//!    event. This is what lets reconciliation passes terminate.
//! 4. Lifecycle events fire only on connectivity *changes*; moving a node
//!    between two connected parents emits nothing.

use ahash::AHashMap;
use tracing::trace;

/// Generational handle to a document node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Who performed a mutation. The engine tags its own writes so observers can
/// tell "moved by us" from "moved by the host".
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Actor {
    Host,
    Engine,
}

/// One recorded mutation, drained in order by the consumer.
#[derive(Clone, Debug)]
pub struct MutationRecord {
    pub target: NodeId,
    pub actor: Actor,
    pub kind: MutationKind,
}

#[derive(Clone, Debug)]
pub enum MutationKind {
    /// An attribute was set or removed on `target`.
    Attribute {
        name: String,
        old: Option<String>,
        new: Option<String>,
    },
    /// The child list of `target` changed.
    ChildList,
}

/// Component lifecycle phase, mirroring the host's instance callbacks.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum LifecyclePhase {
    Attached,
    Detached,
    DataChanged,
}

/// A lifecycle notification for one component-bound node.
#[derive(Clone, Debug)]
pub struct LifecycleEvent {
    pub node: NodeId,
    /// Component kind (class name) bound to the node.
    pub kind: String,
    pub phase: LifecyclePhase,
    /// Actor whose mutation caused the event. `DataChanged` is always host.
    pub actor: Actor,
}

struct NodeData {
    tag: String,
    attrs: AHashMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    component: Option<String>,
}

struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// The document tree.
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    actor: Actor,
    mutations: Vec<MutationRecord>,
    lifecycle: Vec<LifecycleEvent>,
    /// Raw per-(kind, phase) dispatch counts, incremented at emission. The
    /// host side always runs exactly once per event; consumers can compare
    /// their delivery counts against these.
    dispatch_counts: AHashMap<(String, LifecyclePhase), u64>,
    history: Option<Vec<MutationRecord>>,
}

impl Document {
    /// Create a document with a connected root node (tag `body`).
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            actor: Actor::Host,
            mutations: Vec::new(),
            lifecycle: Vec::new(),
            dispatch_counts: AHashMap::new(),
            history: None,
        };
        doc.root = doc.create_element("body");
        doc
    }

    /// The always-connected root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Allocate a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        let data = NodeData {
            tag: tag.into(),
            attrs: AHashMap::new(),
            parent: None,
            children: Vec::new(),
            component: None,
        };
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.data = Some(data);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    data: Some(data),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Bind a component kind to a node. Connectivity changes of the node will
    /// emit lifecycle events for this kind from then on.
    pub fn set_component(&mut self, id: NodeId, kind: impl Into<String>) {
        if let Some(data) = self.data_mut(id) {
            data.component = Some(kind.into());
        }
    }

    pub fn component(&self, id: NodeId) -> Option<&str> {
        self.data(id).and_then(|d| d.component.as_deref())
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.data(id).is_some()
    }

    /// Whether `id` is reachable from the root by parent links.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == self.root {
                return self.is_alive(id);
            }
            match self.data(cur).and_then(|d| d.parent) {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.data(id).map(|d| d.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).and_then(|d| d.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.data(id).map(|d| d.children.as_slice()).unwrap_or(&[])
    }

    /// The sibling immediately after `id`, if any.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let children = self.children(parent);
        let pos = children.iter().position(|&c| c == id)?;
        children.get(pos + 1).copied()
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.data(id).and_then(|d| d.attrs.get(name)).map(|s| s.as_str())
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    /// Set an attribute. Writing the current value is a no-op.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let old = match self.data_mut(id) {
            Some(data) => {
                if data.attrs.get(name).map(|v| v.as_str()) == Some(value.as_str()) {
                    return;
                }
                data.attrs.insert(name.to_string(), value.clone())
            }
            None => return,
        };
        self.record(MutationRecord {
            target: id,
            actor: self.actor,
            kind: MutationKind::Attribute {
                name: name.to_string(),
                old,
                new: Some(value),
            },
        });
    }

    /// Remove an attribute. Removing an absent attribute is a no-op.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        let old = match self.data_mut(id) {
            Some(data) => match data.attrs.remove(name) {
                Some(old) => old,
                None => return,
            },
            None => return,
        };
        self.record(MutationRecord {
            target: id,
            actor: self.actor,
            kind: MutationKind::Attribute {
                name: name.to_string(),
                old: Some(old),
                new: None,
            },
        });
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// current parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.move_node(parent, child, None);
    }

    /// Insert `child` into `parent` immediately before `reference`
    /// (or append when `reference` is `None`).
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        self.move_node(parent, child, reference);
    }

    /// Detach `child` from its parent; the node stays alive but disconnected.
    pub fn detach(&mut self, child: NodeId) {
        if !self.is_alive(child) || self.parent(child).is_none() {
            return;
        }
        let was_connected = self.is_connected(child);
        self.unlink(child);
        if was_connected {
            self.emit_connectivity(child, LifecyclePhase::Detached);
        }
    }

    /// Destroy a subtree: detach it, emit detach lifecycle for connected
    /// components, then free every slot (bumping generations so existing
    /// handles go dead).
    pub fn destroy(&mut self, id: NodeId) {
        if !self.is_alive(id) || id == self.root {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let children = match self.data_mut(n) {
                Some(data) => std::mem::take(&mut data.children),
                None => continue,
            };
            stack.extend(children);
            let slot = &mut self.slots[n.index as usize];
            slot.data = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(n.index);
        }
    }

    fn move_node(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if !self.is_alive(parent) || !self.is_alive(child) || parent == child {
            return;
        }
        // Refuse to create a cycle.
        let mut cur = Some(parent);
        while let Some(n) = cur {
            if n == child {
                return;
            }
            cur = self.parent(n);
        }
        let was_connected = self.is_connected(child);
        self.unlink(child);
        let index = match reference {
            Some(r) => self
                .children(parent)
                .iter()
                .position(|&c| c == r)
                .unwrap_or(self.children(parent).len()),
            None => self.children(parent).len(),
        };
        if let Some(data) = self.data_mut(child) {
            data.parent = Some(parent);
        }
        if let Some(data) = self.data_mut(parent) {
            data.children.insert(index, child);
        }
        self.record(MutationRecord {
            target: parent,
            actor: self.actor,
            kind: MutationKind::ChildList,
        });
        let now_connected = self.is_connected(child);
        if was_connected && !now_connected {
            self.emit_connectivity(child, LifecyclePhase::Detached);
        } else if !was_connected && now_connected {
            self.emit_connectivity(child, LifecyclePhase::Attached);
        }
    }

    fn unlink(&mut self, child: NodeId) {
        let Some(parent) = self.parent(child) else {
            return;
        };
        if let Some(data) = self.data_mut(parent) {
            data.children.retain(|&c| c != child);
        }
        if let Some(data) = self.data_mut(child) {
            data.parent = None;
        }
        self.record(MutationRecord {
            target: parent,
            actor: self.actor,
            kind: MutationKind::ChildList,
        });
    }

    /// Notify that the component bound to `id` mutated its data. Host-only
    /// signal; no-op for nodes without a component binding.
    pub fn data_changed(&mut self, id: NodeId) {
        let Some(kind) = self.component(id).map(|k| k.to_string()) else {
            return;
        };
        self.emit(LifecycleEvent {
            node: id,
            kind,
            phase: LifecyclePhase::DataChanged,
            actor: Actor::Host,
        });
    }

    /// Emit lifecycle events for every component-bound node in the subtree.
    fn emit_connectivity(&mut self, subtree: NodeId, phase: LifecyclePhase) {
        let mut stack = vec![subtree];
        let mut events = Vec::new();
        while let Some(n) = stack.pop() {
            if let Some(kind) = self.component(n) {
                events.push(LifecycleEvent {
                    node: n,
                    kind: kind.to_string(),
                    phase,
                    actor: self.actor,
                });
            }
            stack.extend_from_slice(self.children(n));
        }
        for ev in events {
            self.emit(ev);
        }
    }

    fn emit(&mut self, ev: LifecycleEvent) {
        trace!(kind = %ev.kind, phase = ?ev.phase, actor = ?ev.actor, "lifecycle event");
        *self
            .dispatch_counts
            .entry((ev.kind.clone(), ev.phase))
            .or_insert(0) += 1;
        self.lifecycle.push(ev);
    }

    fn record(&mut self, rec: MutationRecord) {
        if let Some(history) = self.history.as_mut() {
            history.push(rec.clone());
        }
        self.mutations.push(rec);
    }

    /// Take the pending mutation records, oldest first.
    pub fn drain_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutations)
    }

    /// Take the pending lifecycle events, oldest first.
    pub fn drain_lifecycle(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.lifecycle)
    }

    /// How many times the host dispatched `phase` for component `kind`.
    pub fn dispatch_count(&self, kind: &str, phase: LifecyclePhase) -> u64 {
        self.dispatch_counts
            .get(&(kind.to_string(), phase))
            .copied()
            .unwrap_or(0)
    }

    /// Enable or disable the persistent mutation history (off by default).
    pub fn set_history(&mut self, enabled: bool) {
        if enabled && self.history.is_none() {
            self.history = Some(Vec::new());
        } else if !enabled {
            self.history = None;
        }
    }

    /// Take the recorded history, if recording is enabled.
    pub fn take_history(&mut self) -> Vec<MutationRecord> {
        self.history.as_mut().map(std::mem::take).unwrap_or_default()
    }

    /// Run `f` with mutations tagged as [`Actor::Engine`]. The actor is
    /// restored when the returned guard drops, including on early exit.
    pub fn as_engine(&mut self) -> EngineActor<'_> {
        let prev = self.actor;
        self.actor = Actor::Engine;
        EngineActor { doc: self, prev }
    }

    pub fn current_actor(&self) -> Actor {
        self.actor
    }

    fn data(&self, id: NodeId) -> Option<&NodeData> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.data.as_ref()
    }

    fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.data.as_mut()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Scope guard that tags mutations with [`Actor::Engine`] until dropped.
pub struct EngineActor<'a> {
    doc: &'a mut Document,
    prev: Actor,
}

impl std::ops::Deref for EngineActor<'_> {
    type Target = Document;
    fn deref(&self) -> &Document {
        self.doc
    }
}

impl std::ops::DerefMut for EngineActor<'_> {
    fn deref_mut(&mut self) -> &mut Document {
        self.doc
    }
}

impl Drop for EngineActor<'_> {
    fn drop(&mut self) {
        self.doc.actor = self.prev;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_handle_reads_dead_after_slot_reuse() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        doc.append_child(doc.root(), a);
        doc.destroy(a);
        let b = doc.create_element("span");
        assert_eq!(b.index, a.index, "slot should be reused");
        assert!(!doc.is_alive(a));
        assert!(doc.is_alive(b));
        assert_eq!(doc.tag(a), None);
    }

    #[test]
    fn connectivity_follows_parent_links() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        doc.append_child(a, b);
        assert!(!doc.is_connected(b));
        doc.append_child(doc.root(), a);
        assert!(doc.is_connected(b));
        doc.detach(a);
        assert!(!doc.is_connected(b));
        assert!(doc.is_alive(b));
    }

    #[test]
    fn no_op_attribute_write_records_nothing() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        doc.set_attribute(a, "x", "1");
        doc.drain_mutations();
        doc.set_attribute(a, "x", "1");
        assert!(doc.drain_mutations().is_empty());
        doc.remove_attribute(a, "absent");
        assert!(doc.drain_mutations().is_empty());
    }

    #[test]
    fn attribute_record_carries_old_and_new() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        doc.set_attribute(a, "x", "1");
        doc.set_attribute(a, "x", "2");
        let recs = doc.drain_mutations();
        match &recs[1].kind {
            MutationKind::Attribute { name, old, new } => {
                assert_eq!(name, "x");
                assert_eq!(old.as_deref(), Some("1"));
                assert_eq!(new.as_deref(), Some("2"));
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[test]
    fn lifecycle_fires_only_on_connectivity_change() {
        let mut doc = Document::new();
        let panel = doc.create_element("panel");
        doc.set_component(panel, "panel-kind");
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        doc.append_child(doc.root(), a);
        doc.append_child(doc.root(), b);
        doc.append_child(a, panel);
        let evs = doc.drain_lifecycle();
        assert_eq!(evs.len(), 1);
        assert_eq!(evs[0].phase, LifecyclePhase::Attached);

        // Move between two connected parents: no events.
        doc.append_child(b, panel);
        assert!(doc.drain_lifecycle().is_empty());

        doc.detach(panel);
        let evs = doc.drain_lifecycle();
        assert_eq!(evs.len(), 1);
        assert_eq!(evs[0].phase, LifecyclePhase::Detached);
    }

    #[test]
    fn destroy_emits_detach_for_connected_subtree_components() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("panel");
        doc.set_component(inner, "inner-kind");
        doc.append_child(doc.root(), outer);
        doc.append_child(outer, inner);
        doc.drain_lifecycle();
        doc.destroy(outer);
        let evs = doc.drain_lifecycle();
        assert_eq!(evs.len(), 1);
        assert_eq!(evs[0].kind, "inner-kind");
        assert_eq!(evs[0].phase, LifecyclePhase::Detached);
        assert!(!doc.is_alive(inner));
    }

    #[test]
    fn engine_actor_guard_restores_on_drop() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        {
            let mut engine = doc.as_engine();
            engine.set_attribute(a, "x", "1");
        }
        doc.set_attribute(a, "y", "1");
        let recs = doc.drain_mutations();
        assert_eq!(recs[0].actor, Actor::Engine);
        assert_eq!(recs[1].actor, Actor::Host);
    }

    #[test]
    fn dispatch_counts_track_emissions() {
        let mut doc = Document::new();
        let panel = doc.create_element("panel");
        doc.set_component(panel, "k");
        doc.append_child(doc.root(), panel);
        doc.detach(panel);
        doc.append_child(doc.root(), panel);
        assert_eq!(doc.dispatch_count("k", LifecyclePhase::Attached), 2);
        assert_eq!(doc.dispatch_count("k", LifecyclePhase::Detached), 1);
        doc.data_changed(panel);
        assert_eq!(doc.dispatch_count("k", LifecyclePhase::DataChanged), 1);
    }

    #[test]
    fn cycle_creation_is_refused() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        doc.append_child(a, b);
        doc.append_child(b, a);
        assert_eq!(doc.parent(a), None);
        assert_eq!(doc.parent(b), Some(a));
    }
}
