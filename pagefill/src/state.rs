use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;
use core::ops::Range;

/// An immutable snapshot of everything a [`crate::PaginatedSource`] has loaded so far.
///
/// `loaded` is append-only across the lifetime of one source: every state emitted after this
/// one has `self.loaded()` as a prefix. `page()` is exactly the suffix added by the load that
/// produced this state (possibly empty).
///
/// Cloning is cheap; the loaded items are shared.
pub struct PaginatedState<T> {
    loaded: Rc<[T]>,
    page_start: usize,
    has_more: bool,
}

impl<T> PaginatedState<T> {
    /// The state of a source that has not loaded anything yet.
    pub fn initial() -> Self {
        Self {
            loaded: Rc::from(Vec::new()),
            page_start: 0,
            has_more: true,
        }
    }

    /// A state seeded with already-available items. The whole seed counts as the current page.
    pub fn with_loaded(items: Vec<T>, has_more: bool) -> Self {
        Self {
            loaded: Rc::from(items),
            page_start: 0,
            has_more,
        }
    }

    /// All items fetched so far, in order.
    pub fn loaded(&self) -> &[T] {
        &self.loaded
    }

    /// The items added by the most recent successful load.
    pub fn page(&self) -> &[T] {
        &self.loaded[self.page_start..]
    }

    /// Index in `loaded()` where `page()` starts.
    pub fn page_start(&self) -> usize {
        self.page_start
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.loaded.get(index)
    }

    pub fn progress(&self) -> PageProgress {
        PageProgress {
            loaded: self.loaded.len(),
            page: self.loaded.len() - self.page_start,
            has_more: self.has_more,
        }
    }

    /// Runs the accept filter for this state against `cursor`.
    ///
    /// See [`PageCursor::accept`].
    pub fn accept(&self, cursor: &mut PageCursor) -> Option<Range<usize>> {
        cursor.accept(self.progress())
    }
}

impl<T: Clone> PaginatedState<T> {
    /// Builds the successor state by appending `items` as the new page.
    pub(crate) fn append(&self, items: Vec<T>, has_more: bool) -> Self {
        let page_start = self.loaded.len();
        let mut loaded = Vec::with_capacity(page_start + items.len());
        loaded.extend_from_slice(&self.loaded);
        loaded.extend(items);
        Self {
            loaded: Rc::from(loaded),
            page_start,
            has_more,
        }
    }
}

impl<T> Clone for PaginatedState<T> {
    fn clone(&self) -> Self {
        Self {
            loaded: Rc::clone(&self.loaded),
            page_start: self.page_start,
            has_more: self.has_more,
        }
    }
}

impl<T> Default for PaginatedState<T> {
    fn default() -> Self {
        Self::initial()
    }
}

impl<T: fmt::Debug> fmt::Debug for PaginatedState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatedState")
            .field("loaded", &self.loaded.len())
            .field("page", &self.page())
            .field("has_more", &self.has_more)
            .finish()
    }
}

/// The shape of a paginated snapshot, stripped of its items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageProgress {
    /// Number of items loaded so far.
    pub loaded: usize,
    /// Number of items added by the most recent load.
    pub page: usize,
    pub has_more: bool,
}

impl PageProgress {
    pub fn page_start(&self) -> usize {
        self.loaded.saturating_sub(self.page)
    }
}

/// What a consumer has already acted upon: the loaded length and `has_more` flag of the last
/// accepted state.
///
/// The cursor is the accept filter. Only forward progress passes it, so re-emissions and
/// stale states never produce a second insert for the same items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageCursor {
    loaded: usize,
    has_more: bool,
}

impl PageCursor {
    pub fn new(loaded: usize, has_more: bool) -> Self {
        Self { loaded, has_more }
    }

    /// A cursor positioned at the state a consumer was bound with.
    pub fn from_progress(progress: PageProgress) -> Self {
        Self::new(progress.loaded, progress.has_more)
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Accepts `progress` if it moves past this cursor, returning the item range to insert.
    ///
    /// - A state with more loaded items than the cursor is accepted; the returned range is
    ///   `loaded - page .. loaded`. If the page does not start at the cursor (an emission was
    ///   missed) the range starts at the cursor instead, so the consumer stays contiguous.
    /// - A state with no new items is accepted only when it flips `has_more` to `false`; the
    ///   returned range is empty.
    /// - Anything else is a no-op re-emission and returns `None`.
    pub fn accept(&mut self, progress: PageProgress) -> Option<Range<usize>> {
        if progress.loaded > self.loaded {
            let mut start = progress.page_start();
            if start != self.loaded {
                pwarn!(
                    cursor = self.loaded,
                    page_start = start,
                    loaded = progress.loaded,
                    "PageCursor: page is not contiguous with the cursor, inserting the gap"
                );
                start = self.loaded;
            }
            self.loaded = progress.loaded;
            self.has_more = progress.has_more;
            return Some(start..progress.loaded);
        }

        if progress.loaded == self.loaded && self.has_more && !progress.has_more {
            self.has_more = false;
            return Some(self.loaded..self.loaded);
        }

        None
    }
}
