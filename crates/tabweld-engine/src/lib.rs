#![forbid(unsafe_code)]

//! Fragment synchronization engine for SPA host pages.
//!
//! The engine keeps a set of host-owned page fragments (related list,
//! comments, description, live chat, playlist) welded into a managed tab
//! container, and arbitrates the panels that compete with those tabs for the
//! same screen region. It never blocks and never acts re-entrantly: host
//! events are drained, reactions are scheduled as ticketed tasks, and every
//! task re-validates its generation ticket before producing effects.
//!
//! # Key Components
//!
//! - [`Engine`] - the pump loop and public control surface
//! - [`EngineConfig`] - selectors, hook specs, and tick delays
//! - [`EpochTable`] - per-concern generation counters, the cancellation
//!   mechanism
//! - [`SlotTable`] - self-healing fragment registry keyed by [`FragmentSlot`]
//! - [`HookInstaller`] - idempotent, deferrable lifecycle hook wiring
//! - [`UiFlags`] / [`rules`] - the flag snapshot and the declarative
//!   transition table driving corrective actions
//! - [`reparent`] - identity-preserving fragment relocation
//!
//! # Invariants
//!
//! 1. A superseded ticket never produces effects.
//! 2. The engine's own child-list mutations never re-trigger its observers.
//! 3. Corrective attribute writes converge: a pass over an unchanged
//!    snapshot fires no rules, and no-op writes record nothing.

pub mod config;
pub mod contract;
pub mod engine;
pub mod epoch;
pub mod flags;
pub mod hooks;
pub mod navigation;
pub mod observers;
pub mod panel_state;
pub mod registry;
pub mod reparent;
pub mod rules;
pub mod scheduler;
pub mod tabs;

pub use config::EngineConfig;
pub use contract::TabId;
pub use engine::{Engine, EngineStats};
pub use epoch::{EpochKey, EpochTable, TICKET_CEILING, TICKET_RESET, Ticket};
pub use flags::UiFlags;
pub use hooks::{HookError, HookInstaller, HookReaction, HookSpec};
pub use navigation::NavigationCoordinator;
pub use panel_state::{PanelOwner, PanelState};
pub use registry::{FragmentSlot, SlotTable};
pub use reparent::{ReparentError, reparent};
pub use rules::{Corrective, RULES, Rule, evaluate};
pub use scheduler::{Scheduler, Task, TaskKind};
