#![forbid(unsafe_code)]

//! Component-class registry.
//!
//! The host defines component classes at its own pace; consumers that want to
//! hook a class must wait until it is defined. There is no callback surface —
//! consumers poll [`ClassRegistry::is_defined`] from their own scheduling
//! loop, which keeps delivery ordering in one place. Redefinition is
//! tolerated and is a no-op.

use ahash::AHashSet;

#[derive(Default)]
pub struct ClassRegistry {
    defined: AHashSet<String>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a class as defined. Defining twice is a no-op.
    pub fn define(&mut self, name: impl Into<String>) {
        self.defined.insert(name.into());
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    pub fn defined_count(&self) -> usize {
        self.defined.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_is_idempotent() {
        let mut reg = ClassRegistry::new();
        reg.define("live-chat");
        reg.define("live-chat");
        assert!(reg.is_defined("live-chat"));
        assert_eq!(reg.defined_count(), 1);
    }

    #[test]
    fn undefined_class_reads_false() {
        let reg = ClassRegistry::new();
        assert!(!reg.is_defined("playlist-panel"));
    }
}
