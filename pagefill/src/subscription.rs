use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::mem;

/// A handle to a registration (observer, listener, ...) that can be released exactly once.
///
/// Releasing is idempotent. Dropping an active handle releases it.
#[must_use = "dropping a Subscription releases it immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle that is already released.
    pub fn empty() -> Self {
        Self { release: None }
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    pub fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// An owning scope for subscriptions.
///
/// Work registered on behalf of one owner (a screen, a bound adapter) is collected here and
/// released together by [`LifecycleScope::close`], exactly once, in reverse registration
/// order. Handles added after the scope closed are released immediately.
#[derive(Default)]
pub struct LifecycleScope {
    handles: RefCell<Vec<Subscription>>,
    closed: Cell<bool>,
}

impl LifecycleScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, subscription: Subscription) {
        if self.closed.get() {
            drop(subscription);
            return;
        }
        self.handles.borrow_mut().push(subscription);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Number of handles currently held.
    pub fn len(&self) -> usize {
        self.handles.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.borrow().is_empty()
    }

    /// Releases every held handle. Returns `false` if the scope was already closed.
    pub fn close(&self) -> bool {
        if self.closed.replace(true) {
            return false;
        }
        // Release outside the borrow: a release closure may touch this scope again.
        let handles = mem::take(&mut *self.handles.borrow_mut());
        for mut handle in handles.into_iter().rev() {
            handle.release();
        }
        true
    }
}

impl Drop for LifecycleScope {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for LifecycleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleScope")
            .field("handles", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
