//! Determinism and idempotence of the transition rule table.
//!
//! 1. An unchanged snapshot fires no rule, for every snapshot.
//! 2. For every `(p, q)` pair over the tracked bits, the fired actions never
//!    contain two members of a mutually exclusive pair. This is stronger
//!    than single-bit determinism and holds by construction of the table's
//!    require/forbid conditions; verified exhaustively here.
//! 3. Rule evaluation is a pure function of `(p, q)`.

use proptest::prelude::*;
use tabweld_engine::rules::{Corrective, evaluate};
use tabweld_engine::UiFlags;

const BITS: u16 = 9;

fn flags(bits: u16) -> UiFlags {
    UiFlags::from_bits_truncate(bits)
}

fn fired(p: UiFlags, q: UiFlags) -> Vec<Corrective> {
    evaluate(p, q).iter().map(|r| r.action).collect()
}

#[test]
fn every_unchanged_snapshot_is_a_fixed_point() {
    for bits in 0..(1u16 << BITS) {
        let q = flags(bits);
        assert!(evaluate(q, q).is_empty(), "rules fired on p == q: {q:?}");
    }
}

#[test]
fn no_transition_fires_conflicting_actions() {
    for p_bits in 0..(1u16 << BITS) {
        for q_bits in 0..(1u16 << BITS) {
            let actions = fired(flags(p_bits), flags(q_bits));
            for (i, a) in actions.iter().enumerate() {
                for b in &actions[i + 1..] {
                    assert!(
                        !a.conflicts_with(*b),
                        "conflicting actions {a:?} and {b:?} for p={p_bits:#b} q={q_bits:#b}"
                    );
                }
            }
        }
    }
}

#[test]
fn single_bit_transitions_fire_at_most_one_tab_action() {
    for p_bits in 0..(1u16 << BITS) {
        for bit in 0..BITS {
            let q_bits = p_bits ^ (1 << bit);
            let actions = fired(flags(p_bits), flags(q_bits));
            let tab_actions = actions
                .iter()
                .filter(|a| {
                    matches!(a, Corrective::SwitchToNoTab | Corrective::SwitchToLastTab)
                })
                .count();
            assert!(
                tab_actions <= 1,
                "multiple tab actions for p={p_bits:#b} flipping bit {bit}"
            );
        }
    }
}

proptest! {
    #[test]
    fn evaluation_is_deterministic(p_bits in 0u16..(1 << BITS), q_bits in 0u16..(1 << BITS)) {
        let p = flags(p_bits);
        let q = flags(q_bits);
        prop_assert_eq!(fired(p, q), fired(p, q));
    }

    #[test]
    fn rules_never_fire_without_a_rise_or_fall(bits in 0u16..(1 << BITS)) {
        let q = flags(bits);
        prop_assert!(evaluate(q, q).is_empty());
    }
}
