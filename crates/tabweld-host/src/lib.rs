#![forbid(unsafe_code)]

//! Host-page model for tabweld.
//!
//! This crate models the collaborator side of the engine contract: a mutable
//! document tree owned by the host application, a component-class registry
//! with deferred definition, per-instance lifecycle notifications, and the
//! navigation-finished signal. The engine never sees browser internals; it
//! sees this surface.
//!
//! # Key Components
//!
//! - [`Document`] - arena-backed node tree with attribute storage, actor-tagged
//!   mutation records, and lifecycle emission on connectivity changes
//! - [`NodeId`] - generational handle; stale handles read as dead
//! - [`Selector`] - minimal structural selector (tag, `#id`, `[attr]`,
//!   `[attr=value]`, descendant chains)
//! - [`ClassRegistry`] - component-class definitions with `when_defined`-style
//!   polling
//! - [`HostPage`] - document + registry + navigation signal, the unit the
//!   engine pumps against

pub mod document;
pub mod lifecycle;
pub mod page;
pub mod selector;

pub use document::{
    Actor, Document, LifecycleEvent, LifecyclePhase, MutationKind, MutationRecord, NodeId,
};
pub use lifecycle::ClassRegistry;
pub use page::HostPage;
pub use selector::Selector;
