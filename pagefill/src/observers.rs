use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

/// Identifies one registration in an [`ObserverList`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverKey(u64);

impl ObserverKey {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// An ordered list of shared observers for single-threaded dispatch.
///
/// Dispatch iterates over a snapshot, so observers may add or remove registrations (including
/// their own) while being notified. An observer removed mid-dispatch is not called afterwards.
pub struct ObserverList<L: ?Sized> {
    entries: RefCell<Vec<(ObserverKey, Rc<L>)>>,
    next_key: Cell<u64>,
}

impl<L: ?Sized> ObserverList<L> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            next_key: Cell::new(0),
        }
    }

    pub fn add(&self, observer: Rc<L>) -> ObserverKey {
        let key = ObserverKey(self.next_key.get());
        self.next_key.set(key.0.wrapping_add(1));
        self.entries.borrow_mut().push((key, observer));
        key
    }

    /// Returns `true` if the key was registered.
    pub fn remove(&self, key: ObserverKey) -> bool {
        let mut entries = self.entries.borrow_mut();
        let Some(pos) = entries.iter().position(|(k, _)| *k == key) else {
            return false;
        };
        entries.remove(pos);
        true
    }

    pub fn contains(&self, key: ObserverKey) -> bool {
        self.entries.borrow().iter().any(|(k, _)| *k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        let drained: Vec<_> = self.entries.borrow_mut().drain(..).collect();
        drop(drained);
    }

    pub fn snapshot(&self) -> Vec<(ObserverKey, Rc<L>)> {
        self.entries
            .borrow()
            .iter()
            .map(|(k, o)| (*k, Rc::clone(o)))
            .collect()
    }

    /// Calls `f` for every observer registered at the start of the call that is still
    /// registered when its turn comes.
    pub fn for_each_live(&self, mut f: impl FnMut(&L)) {
        for (key, observer) in self.snapshot() {
            if self.contains(key) {
                f(&observer);
            }
        }
    }
}

impl<L: ?Sized> Default for ObserverList<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> fmt::Debug for ObserverList<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
