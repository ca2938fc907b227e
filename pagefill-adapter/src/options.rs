use alloc::borrow::Cow;

use pagefill::{DEFAULT_LOAD_MORE_THRESHOLD, ScrollTrigger};

use crate::DEFAULT_STATE_CACHE_KEY;

/// Configuration for a [`crate::SubListAdapter`] and the holder that binds it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdapterOptions {
    /// Proportion of the scrollable range past which scrolling requests the next page.
    pub load_more_threshold: f32,
    /// Key of the saved scroll position in the description cache.
    pub state_cache_key: Cow<'static, str>,
    /// Whether binding starts the auto-fill loop. When disabled only scrolling requests pages.
    pub initial_fill: bool,
}

impl AdapterOptions {
    pub fn new() -> Self {
        Self {
            load_more_threshold: DEFAULT_LOAD_MORE_THRESHOLD,
            state_cache_key: Cow::Borrowed(DEFAULT_STATE_CACHE_KEY),
            initial_fill: true,
        }
    }

    pub fn with_load_more_threshold(mut self, threshold: f32) -> Self {
        self.load_more_threshold = threshold;
        self
    }

    pub fn with_state_cache_key(mut self, key: impl Into<Cow<'static, str>>) -> Self {
        self.state_cache_key = key.into();
        self
    }

    pub fn with_initial_fill(mut self, initial_fill: bool) -> Self {
        self.initial_fill = initial_fill;
        self
    }

    pub fn scroll_trigger(&self) -> ScrollTrigger {
        ScrollTrigger::new(self.load_more_threshold)
    }
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self::new()
    }
}
