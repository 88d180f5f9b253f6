#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! Selectors and component-class names here encode the host contract; they
//! are expected to need adjustment when the host redesigns its page
//! structure. Delays are logical scheduler ticks, not wall time.

use crate::hooks::HookSpec;
use crate::registry::FragmentSlot;
use tabweld_host::Selector;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Locates the page root after navigation.
    pub page_root_selector: Selector,
    /// Locates the side column (under the page root) that gets wrapped.
    pub side_column_selector: Selector,
    /// Tag of host engagement panels.
    pub engagement_panel_tag: String,
    /// Page-root attributes set by competing external plugins. Any present
    /// attribute routes reconciliation through the plugin-override path.
    pub plugin_attributes: Vec<String>,
    /// Lifecycle hooks to install, one per host component class.
    pub hooks: Vec<HookSpec>,
    /// Ticks to wait before post-layout fixup passes, letting the host's own
    /// rendering settle first.
    pub settle_delay_ticks: u32,
    /// Ticks between root-resolution retries after navigation.
    pub retry_delay_ticks: u32,
    /// Root-resolution attempts per navigation before giving up.
    pub max_root_retries: u32,
    /// Pump-round budget for `run_until_idle`.
    pub max_idle_rounds: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_root_selector: Selector::parse("watch-page")
                .expect("default selector parses"),
            side_column_selector: Selector::parse("aside#secondary")
                .expect("default selector parses"),
            engagement_panel_tag: "engagement-panel".to_string(),
            plugin_attributes: Vec::new(),
            hooks: default_hooks(),
            settle_delay_ticks: 2,
            retry_delay_ticks: 4,
            max_root_retries: 8,
            max_idle_rounds: 64,
        }
    }
}

fn default_hooks() -> Vec<HookSpec> {
    vec![
        HookSpec::fragment("related-list", FragmentSlot::Related),
        HookSpec::fragment("comments-section", FragmentSlot::Comments),
        HookSpec::fragment("description-panel", FragmentSlot::Info),
        HookSpec::fragment("live-chat", FragmentSlot::Chat),
        HookSpec::fragment("playlist-panel", FragmentSlot::Playlist),
        HookSpec::data_only("watch-page"),
    ]
}
