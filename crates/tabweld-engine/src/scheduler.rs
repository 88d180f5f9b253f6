#![forbid(unsafe_code)]

//! Deterministic single-threaded task scheduling.
//!
//! The engine has no parallelism; "concurrency" is ordering and staleness
//! between interleaved continuations. Tasks are data, not closures, so the
//! queue stays auditable and every execution site performs the same staleness
//! check. Delays are logical ticks: a task with `delay = n` becomes due after
//! `n` scheduling rounds, which is how the original's "let the host's
//! rendering settle" waits are expressed.
//!
//! A round takes the currently-due tasks as a batch; tasks scheduled while a
//! batch executes run no earlier than the next round, mirroring microtask
//! semantics.

use crate::epoch::{EpochKey, Ticket};
use crate::registry::FragmentSlot;
use std::collections::VecDeque;
use tabweld_host::NodeId;

/// What a scheduled continuation does when it is still current.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TaskKind {
    /// Bind a fragment slot to a node observed attaching.
    BindSlot { slot: FragmentSlot, node: NodeId },
    /// Clear a fragment slot after a detach notification.
    ClearSlot { slot: FragmentSlot },
    /// Run one tab/panel reconciliation pass.
    Reconcile,
    /// Resolve the page root after navigation (bounded retries).
    ResolveRoot { attempt: u32 },
    /// Re-assert fragment placement after a layout flip.
    LayoutFixup,
    /// Re-assert comments visibility for the active tab.
    CommentsFixup,
}

/// A queued continuation with its captured ticket.
#[derive(Clone, Copy, Debug)]
pub struct Task {
    pub key: EpochKey,
    pub ticket: Ticket,
    pub kind: TaskKind,
    pub delay: u32,
}

#[derive(Default)]
pub struct Scheduler {
    queue: VecDeque<Task>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, task: Task) {
        self.queue.push_back(task);
    }

    /// Take every task due this round (FIFO), aging the rest by one tick.
    pub fn take_due(&mut self) -> Vec<Task> {
        let mut due = Vec::new();
        let mut waiting = VecDeque::with_capacity(self.queue.len());
        for mut task in self.queue.drain(..) {
            if task.delay == 0 {
                due.push(task);
            } else {
                task.delay -= 1;
                waiting.push_back(task);
            }
        }
        self.queue = waiting;
        due
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(kind: TaskKind, delay: u32) -> Task {
        Task {
            key: EpochKey::Reconcile,
            ticket: 1,
            kind,
            delay,
        }
    }

    #[test]
    fn due_tasks_come_out_in_fifo_order() {
        let mut sched = Scheduler::new();
        sched.schedule(task(TaskKind::Reconcile, 0));
        sched.schedule(task(TaskKind::LayoutFixup, 0));
        let due = sched.take_due();
        assert_eq!(due[0].kind, TaskKind::Reconcile);
        assert_eq!(due[1].kind, TaskKind::LayoutFixup);
        assert!(sched.is_idle());
    }

    #[test]
    fn delayed_task_becomes_due_after_its_ticks() {
        let mut sched = Scheduler::new();
        sched.schedule(task(TaskKind::CommentsFixup, 2));
        assert!(sched.take_due().is_empty());
        assert!(sched.take_due().is_empty());
        let due = sched.take_due();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].kind, TaskKind::CommentsFixup);
    }

    #[test]
    fn delayed_tasks_keep_relative_order_with_immediate_ones() {
        let mut sched = Scheduler::new();
        sched.schedule(task(TaskKind::LayoutFixup, 1));
        sched.schedule(task(TaskKind::Reconcile, 0));
        let first = sched.take_due();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].kind, TaskKind::Reconcile);
        let second = sched.take_due();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].kind, TaskKind::LayoutFixup);
    }
}
