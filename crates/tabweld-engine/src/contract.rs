#![forbid(unsafe_code)]

//! The attribute and identifier contract at the engine's boundaries.
//!
//! Host-owned names are consumed (a fragile, versioned agreement with the
//! host page); `tw-*` names are owned by the engine and consumed by styling.
//! Styling shows and hides the managed container purely from these
//! attributes; the engine never touches presentation beyond them.

/// Attributes owned by the host.
pub mod host {
    /// Theater mode flag on the page root.
    pub const THEATER: &str = "theater";
    /// Fullscreen flag on the page root.
    pub const FULLSCREEN: &str = "fullscreen";
    /// Two-column layout flag on the page root.
    pub const TWO_COLUMN: &str = "is-two-columns";
    /// Collapsed state on chat and playlist roots.
    pub const COLLAPSED: &str = "collapsed";
    /// Hidden state on host panels.
    pub const HIDDEN: &str = "hidden";
    /// Engagement panel visibility state.
    pub const VISIBILITY: &str = "visibility";
    /// Engagement panel routing target.
    pub const TARGET_ID: &str = "target-id";
    pub const VISIBILITY_EXPANDED: &str = "EXPANDED";
    pub const VISIBILITY_HIDDEN: &str = "HIDDEN";
}

/// Attributes the engine sets on the page root for styling.
pub mod root_attr {
    /// Currently selected tab id; absent when no tab is selected.
    pub const TAB: &str = "tw-tab";
    /// `+` while theater mode is active.
    pub const THEATER: &str = "tw-theater";
    /// `+` expanded, `-` collapsed, absent when no chat exists.
    pub const CHAT: &str = "tw-chat";
    /// `+` expanded, `-` collapsed, absent when no playlist exists.
    pub const PLAYLIST: &str = "tw-playlist";
    /// `+` while any engagement panel is expanded.
    pub const PANELS: &str = "tw-panels";
    /// `2` two-column layout, `1` single-column.
    pub const COLUMNS: &str = "tw-columns";
    /// `+` while fullscreen.
    pub const FULLSCREEN: &str = "tw-fullscreen";
}

/// Fixed identifiers of the managed container structure.
pub mod ids {
    pub const SECONDARY_WRAPPER: &str = "tw-secondary-wrapper";
    pub const TAB_BAR: &str = "tw-tabbar";
    pub const CONTENT_INFO: &str = "tw-content-info";
    pub const CONTENT_COMMENTS: &str = "tw-content-comments";
    pub const CONTENT_VIDEOS: &str = "tw-content-videos";
    pub const CONTENT_PLAYLIST: &str = "tw-content-playlist";
}

/// The managed tabs, in tab-bar order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TabId {
    Info,
    Comments,
    Videos,
    Playlist,
}

impl TabId {
    pub const ALL: [TabId; 4] = [Self::Info, Self::Comments, Self::Videos, Self::Playlist];

    /// Stable identifier used in the `tw-tab` attribute and content ids.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Comments => "comments",
            Self::Videos => "videos",
            Self::Playlist => "playlist",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Self::Info),
            "comments" => Some(Self::Comments),
            "videos" => Some(Self::Videos),
            "playlist" => Some(Self::Playlist),
            _ => None,
        }
    }

    /// Fixed id of this tab's content container.
    pub fn content_id(self) -> &'static str {
        match self {
            Self::Info => ids::CONTENT_INFO,
            Self::Comments => ids::CONTENT_COMMENTS,
            Self::Videos => ids::CONTENT_VIDEOS,
            Self::Playlist => ids::CONTENT_PLAYLIST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_ids_round_trip() {
        for tab in TabId::ALL {
            assert_eq!(TabId::from_str(tab.as_str()), Some(tab));
        }
        assert_eq!(TabId::from_str("bogus"), None);
    }
}
