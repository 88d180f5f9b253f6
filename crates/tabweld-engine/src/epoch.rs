#![forbid(unsafe_code)]

//! Generation counters ("tickets").
//!
//! # Design
//!
//! Every asynchronous concern in the engine holds one [`EpochKey`]. Whenever
//! a new continuation is scheduled under a key, the scheduler calls
//! [`EpochTable::issue`] and captures the returned [`Ticket`]; when the
//! continuation later runs, it calls [`EpochTable::is_current`] and returns
//! without side effects if superseded. This is the engine's entire
//! cancellation mechanism — there are no cancellation tokens and no abort
//! signals, only "am I still the latest?" checks.
//!
//! # Invariants
//!
//! 1. `issue(k)` strictly increases `current(k)` (modulo the wrap below).
//! 2. An operation may produce effects only if its captured ticket equals
//!    `current(key)` at the moment it resumes.
//! 3. Keys are independent: issuing under one key never invalidates another.
//!
//! Tickets wrap to a small reset value past a large ceiling. The wrap exists
//! purely to bound the counter; collisions would need `TICKET_CEILING`
//! issuances between a schedule and its resume.

/// Ceiling past which ticket counters wrap.
pub const TICKET_CEILING: u64 = 1 << 53;

/// Value a counter wraps back to.
pub const TICKET_RESET: u64 = 16;

/// A captured generation value for one key.
pub type Ticket = u64;

/// One key per asynchronous concern.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EpochKey {
    /// Slot rebinding for the related-items list.
    Related,
    /// Slot rebinding for the comments root.
    Comments,
    /// Slot rebinding for the description/info root.
    Info,
    /// Slot rebinding for the chat root.
    Chat,
    /// Slot rebinding for the playlist root.
    Playlist,
    /// Slot rebinding for the page root.
    PageRoot,
    /// Navigation/root-resolution cycle.
    Navigation,
    /// Tab/panel reconciliation passes.
    Reconcile,
    /// Post-layout-flip placement fixups.
    LayoutFixup,
    /// Comments-visibility fixups.
    CommentsFixup,
}

impl EpochKey {
    pub const COUNT: usize = 10;

    pub const ALL: [EpochKey; Self::COUNT] = [
        Self::Related,
        Self::Comments,
        Self::Info,
        Self::Chat,
        Self::Playlist,
        Self::PageRoot,
        Self::Navigation,
        Self::Reconcile,
        Self::LayoutFixup,
        Self::CommentsFixup,
    ];

    fn index(self) -> usize {
        match self {
            Self::Related => 0,
            Self::Comments => 1,
            Self::Info => 2,
            Self::Chat => 3,
            Self::Playlist => 4,
            Self::PageRoot => 5,
            Self::Navigation => 6,
            Self::Reconcile => 7,
            Self::LayoutFixup => 8,
            Self::CommentsFixup => 9,
        }
    }
}

/// Fixed table of per-key counters.
#[derive(Debug, Default)]
pub struct EpochTable {
    current: [Ticket; EpochKey::COUNT],
}

impl EpochTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the key's counter and return the new value.
    pub fn issue(&mut self, key: EpochKey) -> Ticket {
        let slot = &mut self.current[key.index()];
        *slot = if *slot >= TICKET_CEILING {
            TICKET_RESET
        } else {
            *slot + 1
        };
        *slot
    }

    /// The latest issued ticket for the key.
    pub fn current(&self, key: EpochKey) -> Ticket {
        self.current[key.index()]
    }

    /// Whether a captured ticket is still the latest for its key.
    pub fn is_current(&self, key: EpochKey, ticket: Ticket) -> bool {
        self.current(key) == ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_is_monotonic_per_key() {
        let mut table = EpochTable::new();
        let a = table.issue(EpochKey::Chat);
        let b = table.issue(EpochKey::Chat);
        assert!(b > a);
        assert_eq!(table.current(EpochKey::Chat), b);
    }

    #[test]
    fn keys_are_independent() {
        let mut table = EpochTable::new();
        let chat = table.issue(EpochKey::Chat);
        table.issue(EpochKey::Playlist);
        table.issue(EpochKey::Playlist);
        assert!(table.is_current(EpochKey::Chat, chat));
    }

    #[test]
    fn superseded_ticket_is_not_current() {
        let mut table = EpochTable::new();
        let old = table.issue(EpochKey::Reconcile);
        table.issue(EpochKey::Reconcile);
        assert!(!table.is_current(EpochKey::Reconcile, old));
    }

    #[test]
    fn counter_wraps_past_ceiling() {
        let mut table = EpochTable::new();
        table.current[EpochKey::Navigation.index()] = TICKET_CEILING;
        assert_eq!(table.issue(EpochKey::Navigation), TICKET_RESET);
    }
}
