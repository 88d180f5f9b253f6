#![forbid(unsafe_code)]

//! Declarative transition rules for the tab/panel state machine.
//!
//! # Design
//!
//! Each rule matches a flag transition `(p, q)`: bits that must have risen,
//! bits that must have fallen, bits required in `q`, and bits forbidden in
//! `q`. Rules are evaluated in table order and every matching rule fires —
//! corrections may compound (closing an engagement panel can free space that
//! a later pass then fills with a restored tab). Rules only *select* actions;
//! applying them is the state machine's job, which keeps this table
//! unit-testable without any document access.
//!
//! # Invariants
//!
//! 1. Idempotence: `p == q` matches no rule (every rule needs a rise or a
//!    fall).
//! 2. Single-bit determinism: for any `(p, q)` differing in exactly one
//!    tracked bit, the fired actions never contain both members of a
//!    mutually-exclusive pair (no-tab vs last-tab, expand-chat vs
//!    collapse-chat, open-playlist vs close-playlist). Verified exhaustively
//!    in `tests/proptest_rule_determinism.rs`.

use crate::flags::UiFlags;

/// A corrective action the state machine can apply.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Corrective {
    SwitchToNoTab,
    SwitchToLastTab,
    ExpandChat,
    CollapseChat,
    /// Selected by no table rule: opening the playlist panel happens only on
    /// the explicit enter-playlist-tab path. It lives here so the playlist
    /// conflict pair covers both directions.
    OpenPlaylist,
    ClosePlaylist,
    CancelTheater,
    CloseEngagementPanels,
}

impl Corrective {
    /// Actions come in mutually exclusive pairs; two actions conflict when
    /// they belong to the same pair and differ.
    pub fn conflicts_with(self, other: Corrective) -> bool {
        self != other && self.group() == other.group() && self.group() != ActionGroup::Free
    }

    fn group(self) -> ActionGroup {
        match self {
            Self::SwitchToNoTab | Self::SwitchToLastTab => ActionGroup::Tab,
            Self::ExpandChat | Self::CollapseChat => ActionGroup::Chat,
            Self::OpenPlaylist | Self::ClosePlaylist => ActionGroup::Playlist,
            Self::CancelTheater | Self::CloseEngagementPanels => ActionGroup::Free,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ActionGroup {
    Tab,
    Chat,
    Playlist,
    Free,
}

/// One transition rule.
#[derive(Clone, Copy, Debug)]
pub struct Rule {
    pub name: &'static str,
    /// Bits that must be set in `q` and clear in `p`.
    pub rose: UiFlags,
    /// Bits that must be clear in `q` and set in `p`.
    pub fell: UiFlags,
    /// Bits that must be set in `q`.
    pub require: UiFlags,
    /// Bits that must be clear in `q`.
    pub forbid: UiFlags,
    pub action: Corrective,
}

impl Rule {
    pub fn matches(&self, p: UiFlags, q: UiFlags) -> bool {
        let risen = q.difference(p);
        let fallen = p.difference(q);
        risen.contains(self.rose)
            && fallen.contains(self.fell)
            && q.contains(self.require)
            && !q.intersects(self.forbid)
    }
}

/// The ordered rule table. Priority is table order; all matching rules fire.
pub static RULES: &[Rule] = &[
    // Fullscreen and theater claim the whole stage: drop the managed tab.
    Rule {
        name: "fullscreen-clears-tab",
        rose: UiFlags::FULLSCREEN,
        fell: UiFlags::empty(),
        require: UiFlags::TAB_SELECTED,
        forbid: UiFlags::empty(),
        action: Corrective::SwitchToNoTab,
    },
    Rule {
        name: "theater-clears-tab",
        rose: UiFlags::THEATER,
        fell: UiFlags::empty(),
        require: UiFlags::TAB_SELECTED,
        forbid: UiFlags::FULLSCREEN,
        action: Corrective::SwitchToNoTab,
    },
    Rule {
        name: "theater-closes-engagement-panels",
        rose: UiFlags::THEATER,
        fell: UiFlags::empty(),
        require: UiFlags::PANEL_EXPANDED,
        forbid: UiFlags::empty(),
        action: Corrective::CloseEngagementPanels,
    },
    // An engagement panel needs the side column back from theater.
    Rule {
        name: "engagement-panel-cancels-theater",
        rose: UiFlags::PANEL_EXPANDED,
        fell: UiFlags::empty(),
        require: UiFlags::THEATER,
        forbid: UiFlags::FULLSCREEN,
        action: Corrective::CancelTheater,
    },
    // Chat and the managed tab compete for the same region; the newcomer
    // wins and the loser is remembered for restoration.
    Rule {
        name: "chat-takes-region-from-tab",
        rose: UiFlags::CHAT_EXPANDED,
        fell: UiFlags::empty(),
        require: UiFlags::TAB_SELECTED,
        forbid: UiFlags::empty(),
        action: Corrective::SwitchToNoTab,
    },
    Rule {
        name: "chat-takes-region-from-playlist",
        rose: UiFlags::CHAT_EXPANDED,
        fell: UiFlags::empty(),
        require: UiFlags::PLAYLIST_EXPANDED,
        forbid: UiFlags::TAB_SELECTED,
        action: Corrective::ClosePlaylist,
    },
    Rule {
        name: "playlist-takes-region-from-tab",
        rose: UiFlags::PLAYLIST_EXPANDED,
        fell: UiFlags::empty(),
        require: UiFlags::TAB_SELECTED,
        forbid: UiFlags::empty(),
        action: Corrective::SwitchToNoTab,
    },
    Rule {
        name: "playlist-takes-region-from-chat",
        rose: UiFlags::PLAYLIST_EXPANDED,
        fell: UiFlags::empty(),
        require: UiFlags::CHAT_EXPANDED,
        forbid: UiFlags::TAB_SELECTED,
        action: Corrective::CollapseChat,
    },
    Rule {
        name: "tab-collapses-chat",
        rose: UiFlags::TAB_SELECTED,
        fell: UiFlags::empty(),
        require: UiFlags::CHAT_EXPANDED,
        forbid: UiFlags::empty(),
        action: Corrective::CollapseChat,
    },
    Rule {
        name: "tab-closes-playlist",
        rose: UiFlags::TAB_SELECTED,
        fell: UiFlags::empty(),
        require: UiFlags::PLAYLIST_EXPANDED,
        forbid: UiFlags::empty(),
        action: Corrective::ClosePlaylist,
    },
    // A chat appearing expanded in theater with no tab is honored as-is;
    // the action just asserts the expanded state downstream.
    Rule {
        name: "chat-appears-in-theater",
        rose: UiFlags::CHAT_EXPANDED,
        fell: UiFlags::empty(),
        require: UiFlags::THEATER,
        forbid: UiFlags::TAB_SELECTED.union(UiFlags::PLAYLIST_EXPANDED),
        action: Corrective::ExpandChat,
    },
    // Theater ending with nothing else claiming the region restores the tab.
    Rule {
        name: "theater-end-restores-tab",
        rose: UiFlags::empty(),
        fell: UiFlags::THEATER,
        require: UiFlags::empty(),
        forbid: UiFlags::TAB_SELECTED
            .union(UiFlags::CHAT_EXPANDED)
            .union(UiFlags::PLAYLIST_EXPANDED)
            .union(UiFlags::FULLSCREEN),
        action: Corrective::SwitchToLastTab,
    },
];

/// All rules matching the transition, in priority order.
pub fn evaluate(p: UiFlags, q: UiFlags) -> Vec<&'static Rule> {
    if p == q {
        return Vec::new();
    }
    RULES.iter().filter(|r| r.matches(p, q)).collect()
}
