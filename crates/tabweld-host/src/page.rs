#![forbid(unsafe_code)]

//! The host page: document, class registry, and the navigation signal.

use crate::document::Document;
use crate::lifecycle::ClassRegistry;

/// Everything the engine synchronizes against for one page session.
pub struct HostPage {
    pub document: Document,
    pub classes: ClassRegistry,
    pending_navigations: u32,
}

impl HostPage {
    pub fn new() -> Self {
        Self {
            document: Document::new(),
            classes: ClassRegistry::new(),
            pending_navigations: 0,
        }
    }

    /// The host's "navigation finished" signal, fired after each SPA route
    /// change. May fire before the expected root fragment exists.
    pub fn finish_navigation(&mut self) {
        self.pending_navigations += 1;
    }

    /// Take the number of navigation signals fired since the last take.
    pub fn take_navigations(&mut self) -> u32 {
        std::mem::take(&mut self.pending_navigations)
    }
}

impl Default for HostPage {
    fn default() -> Self {
        Self::new()
    }
}
