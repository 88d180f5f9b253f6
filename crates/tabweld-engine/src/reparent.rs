#![forbid(unsafe_code)]

//! The reparenting primitive.
//!
//! # Design
//!
//! Moves host fragments between parents while preserving the pivot's
//! component identity. When the pivot is already a child of the target
//! parent, siblings are staged in a detached container and spliced around
//! the pivot in two passes — the pivot itself is never detached, so its
//! component never sees a detach/attach cycle and keeps its internal state.
//! When the pivot lives elsewhere, the parent's children are replaced
//! wholesale with `before + pivot + after`.
//!
//! Displaced children that end up disconnected are explicitly detached from
//! the staging container before it is destroyed, so their own detach
//! lifecycle fires exactly once instead of the nodes dangling inside a dead
//! subtree.
//!
//! The whole operation runs with mutations tagged as [`Actor::Engine`]
//! (`Document::as_engine`), the re-entrancy marker that lets lifecycle hooks
//! distinguish "moved by us" from "moved by the host". The guard restores
//! the actor on drop, so the marker cannot stay stuck after an error.
//!
//! [`Actor::Engine`]: tabweld_host::Actor::Engine

use std::fmt;
use tabweld_host::{Document, NodeId};
use tracing::debug;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReparentError {
    /// The pivot handle is dead.
    DeadPivot,
    /// The target parent handle is dead.
    DeadParent,
    /// The pivot also appears in a sibling list.
    PivotInSiblings,
}

impl fmt::Display for ReparentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadPivot => write!(f, "reparent pivot is no longer alive"),
            Self::DeadParent => write!(f, "reparent target parent is no longer alive"),
            Self::PivotInSiblings => {
                write!(f, "pivot element listed among its own siblings")
            }
        }
    }
}

/// Rearrange `parent`'s children to exactly `before + pivot + after`.
pub fn reparent(
    doc: &mut Document,
    parent: NodeId,
    pivot: NodeId,
    before: &[NodeId],
    after: &[NodeId],
) -> Result<(), ReparentError> {
    if !doc.is_alive(pivot) {
        return Err(ReparentError::DeadPivot);
    }
    if !doc.is_alive(parent) {
        return Err(ReparentError::DeadParent);
    }
    if before.contains(&pivot) || after.contains(&pivot) {
        return Err(ReparentError::PivotInSiblings);
    }

    let mut doc = doc.as_engine();
    let pivot_is_child = doc.parent(pivot) == Some(parent);
    debug!(?parent, ?pivot, splice = pivot_is_child, "reparenting fragment");

    // Stage every current child except the pivot off-document.
    let staging = doc.create_element("staging");
    let current: Vec<NodeId> = doc.children(parent).to_vec();
    for child in current {
        if child != pivot {
            doc.append_child(staging, child);
        }
    }

    if pivot_is_child {
        // Two splices around the never-detached pivot.
        for &n in before {
            doc.insert_before(parent, n, Some(pivot));
        }
        let anchor = doc.next_sibling(pivot);
        for &n in after {
            doc.insert_before(parent, n, anchor);
        }
    } else {
        for &n in before {
            doc.append_child(parent, n);
        }
        doc.append_child(parent, pivot);
        for &n in after {
            doc.append_child(parent, n);
        }
    }

    // Whatever is still staged was displaced; detach each node so its own
    // lifecycle fires, then drop the staging container.
    let displaced: Vec<NodeId> = doc.children(staging).to_vec();
    for n in displaced {
        doc.detach(n);
    }
    doc.destroy(staging);
    Ok(())
}
