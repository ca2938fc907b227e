use alloc::borrow::Cow;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use core::any::Any;
use core::cell::RefCell;
use core::fmt;

use crate::LayoutManager;

/// Cache key under which the sub-list scroll position is saved by default.
pub const DEFAULT_STATE_CACHE_KEY: &str = "pagefill_sublist_layout_state";

/// A layout manager's saved scroll position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutState {
    /// First visible adapter position, `None` when nothing was laid out.
    pub anchor_position: Option<usize>,
    /// Start of the anchor item relative to the viewport start (negative when partially
    /// scrolled out).
    pub anchor_offset: i32,
}

/// A per-description key/value store that outlives individual view holders.
///
/// Clones share the same entries.
#[derive(Clone, Default)]
pub struct DescriptionCache {
    entries: Rc<RefCell<BTreeMap<String, Rc<dyn Any>>>>,
}

impl DescriptionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the value under `key` if it exists and has type `T`.
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        let entries = self.entries.borrow();
        entries.get(key)?.downcast_ref::<T>().cloned()
    }

    pub fn put<T: 'static>(&self, key: impl Into<String>, value: T) {
        self.entries.borrow_mut().insert(key.into(), Rc::new(value));
    }

    pub fn remove(&self, key: &str) -> bool {
        let removed = self.entries.borrow_mut().remove(key);
        removed.is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl fmt::Debug for DescriptionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.borrow().keys()).finish()
    }
}

/// Saves and restores a sub-list's [`LayoutState`] under one key of a [`DescriptionCache`].
#[derive(Clone, Debug)]
pub struct ScrollMemento {
    cache: DescriptionCache,
    key: Cow<'static, str>,
}

impl ScrollMemento {
    pub fn new(cache: DescriptionCache, key: impl Into<Cow<'static, str>>) -> Self {
        Self {
            cache,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The saved state, if any.
    pub fn peek(&self) -> Option<LayoutState> {
        self.cache.get::<LayoutState>(&self.key)
    }

    /// Stores the layout manager's current state. Returns `false` when it had none to save.
    pub fn save(&self, layout: &dyn LayoutManager) -> bool {
        let Some(state) = layout.save_state() else {
            return false;
        };
        pdebug!(
            key = %self.key,
            anchor = ?state.anchor_position,
            offset = state.anchor_offset,
            "ScrollMemento::save"
        );
        self.cache.put(String::from(&*self.key), state);
        true
    }

    /// Hands a previously saved state to the layout manager. Returns `false` when nothing was
    /// saved.
    pub fn restore(&self, layout: &dyn LayoutManager) -> bool {
        let Some(state) = self.peek() else {
            return false;
        };
        pdebug!(key = %self.key, anchor = ?state.anchor_position, "ScrollMemento::restore");
        layout.restore_state(&state);
        true
    }
}
