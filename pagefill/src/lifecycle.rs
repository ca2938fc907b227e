use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt;

use crate::{ObserverKey, ObserverList};

/// Receives the destroy event of a [`LifecycleOwner`].
pub trait LifecycleObserver {
    fn on_destroy(&self);
}

/// A host-supplied handle to the lifecycle of the owning screen.
pub trait LifecycleOwner {
    fn add_observer(&self, observer: Rc<dyn LifecycleObserver>) -> ObserverKey;

    fn remove_observer(&self, key: ObserverKey);

    fn is_destroyed(&self) -> bool;
}

/// A ready-made [`LifecycleOwner`] for hosts that drive destruction themselves.
///
/// Observers added after [`Lifecycle::destroy`] receive `on_destroy` immediately and are not
/// retained.
#[derive(Default)]
pub struct Lifecycle {
    observers: ObserverList<dyn LifecycleObserver>,
    destroyed: Cell<bool>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Dispatches the destroy event. Calling this more than once is a no-op.
    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        pdebug!(observers = self.observers.len(), "Lifecycle::destroy");
        self.observers.for_each_live(|o| o.on_destroy());
        self.observers.clear();
    }
}

impl LifecycleOwner for Lifecycle {
    fn add_observer(&self, observer: Rc<dyn LifecycleObserver>) -> ObserverKey {
        let key = self.observers.add(Rc::clone(&observer));
        if self.destroyed.get() {
            self.observers.remove(key);
            observer.on_destroy();
        }
        key
    }

    fn remove_observer(&self, key: ObserverKey) {
        self.observers.remove(key);
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("observers", &self.observers.len())
            .field("destroyed", &self.destroyed.get())
            .finish()
    }
}
