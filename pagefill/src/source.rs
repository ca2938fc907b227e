use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::{ObserverList, PageProgress, PaginatedState, Subscription};

/// The data-source capability a sub-list adapter consumes.
///
/// `S` is the snapshot type observers receive. [`PaginatedSource`] implements this with
/// `S = PaginatedState<T>`; other implementations only need to report the [`PageProgress`]
/// of their snapshots.
pub trait PagedData<S> {
    /// The most recent snapshot.
    fn snapshot(&self) -> S;

    fn has_more(&self) -> bool;

    /// Requests the next page. Implementations coalesce redundant calls.
    fn load_more(&self);

    /// Registers an observer for future snapshots. Past snapshots are not replayed.
    fn subscribe(&self, observer: Box<dyn FnMut(&S)>) -> Subscription;

    fn progress(&self, snapshot: &S) -> PageProgress;
}

/// Describes the page a [`PageLoader`] is asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based index of the requested page (number of pages completed so far).
    pub page_index: usize,
    /// Number of items loaded so far; the first item of the new page will land here.
    pub offset: usize,
}

/// One page of results delivered to a [`PageCompletion`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Whether a further page may exist.
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, has_more: bool) -> Self {
        Self { items, has_more }
    }

    /// A final page.
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, false)
    }
}

/// Fetches pages for a [`PaginatedSource`].
///
/// `load` may resolve `completion` synchronously or keep it and resolve it later, as long as
/// it does so on the same (UI) thread. The source never has more than one request outstanding.
pub trait PageLoader<T> {
    fn load(&self, request: PageRequest, completion: PageCompletion<T>);
}

impl<T, F> PageLoader<T> for F
where
    F: Fn(PageRequest, PageCompletion<T>),
{
    fn load(&self, request: PageRequest, completion: PageCompletion<T>) {
        self(request, completion)
    }
}

type StateObserver<T> = RefCell<dyn FnMut(&PaginatedState<T>)>;

struct SourceInner<T> {
    state: RefCell<PaginatedState<T>>,
    in_flight: Cell<Option<u64>>,
    next_ticket: Cell<u64>,
    pages: Cell<usize>,
    loader: Rc<dyn PageLoader<T>>,
    observers: ObserverList<StateObserver<T>>,
    pending: RefCell<VecDeque<PaginatedState<T>>>,
    dispatching: Cell<bool>,
}

/// Owns the items loaded so far and hands out one page request at a time.
///
/// Every successful completion produces a new [`PaginatedState`] that is delivered to all
/// current observers in emission order. Cloning yields another handle to the same source.
pub struct PaginatedSource<T> {
    inner: Rc<SourceInner<T>>,
}

impl<T: Clone + 'static> PaginatedSource<T> {
    pub fn new(loader: impl PageLoader<T> + 'static) -> Self {
        Self::from_state(PaginatedState::initial(), loader)
    }

    /// Starts from items that are already available (e.g. restored from a cache).
    pub fn with_initial(
        items: Vec<T>,
        has_more: bool,
        loader: impl PageLoader<T> + 'static,
    ) -> Self {
        Self::from_state(PaginatedState::with_loaded(items, has_more), loader)
    }

    fn from_state(state: PaginatedState<T>, loader: impl PageLoader<T> + 'static) -> Self {
        pdebug!(
            loaded = state.len(),
            has_more = state.has_more(),
            "PaginatedSource::new"
        );
        Self {
            inner: Rc::new(SourceInner {
                state: RefCell::new(state),
                in_flight: Cell::new(None),
                next_ticket: Cell::new(0),
                pages: Cell::new(0),
                loader: Rc::new(loader),
                observers: ObserverList::new(),
                pending: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
            }),
        }
    }

    /// Requests the next page.
    ///
    /// No-op while a request is outstanding or once the source reported `has_more == false`.
    pub fn load_more(&self) {
        let inner = &self.inner;
        if inner.in_flight.get().is_some() {
            ptrace!("PaginatedSource::load_more: coalesced, request in flight");
            return;
        }
        if !self.has_more() {
            ptrace!("PaginatedSource::load_more: exhausted");
            return;
        }

        let ticket = inner.next_ticket.get();
        inner.next_ticket.set(ticket.wrapping_add(1));
        inner.in_flight.set(Some(ticket));

        let request = PageRequest {
            page_index: inner.pages.get(),
            offset: self.len(),
        };
        pdebug!(
            page_index = request.page_index,
            offset = request.offset,
            "PaginatedSource::load_more"
        );

        let completion = PageCompletion {
            source: Rc::downgrade(inner),
            ticket,
            settled: false,
        };
        let loader = Rc::clone(&inner.loader);
        loader.load(request, completion);
    }

    /// Registers `observer` for every state emitted from now on.
    pub fn observe(&self, observer: impl FnMut(&PaginatedState<T>) + 'static) -> Subscription {
        let observer: Rc<StateObserver<T>> = Rc::new(RefCell::new(observer));
        let key = self.inner.observers.add(observer);
        let source = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = source.upgrade() {
                inner.observers.remove(key);
            }
        })
    }
}

impl<T> PaginatedSource<T> {
    /// The most recent state.
    pub fn state(&self) -> PaginatedState<T> {
        self.inner.state.borrow().clone()
    }

    pub fn has_more(&self) -> bool {
        self.inner.state.borrow().has_more()
    }

    /// `true` while a page request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.inner.in_flight.get().is_some()
    }

    /// Number of items loaded so far.
    pub fn len(&self) -> usize {
        self.inner.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of pages completed so far.
    pub fn pages_loaded(&self) -> usize {
        self.inner.pages.get()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }
}

impl<T> SourceInner<T> {
    fn settle(&self, ticket: u64) -> bool {
        if self.in_flight.get() != Some(ticket) {
            ptrace!(ticket, "PaginatedSource: stale completion ignored");
            return false;
        }
        self.in_flight.set(None);
        true
    }

    fn emit(&self, state: PaginatedState<T>) {
        *self.state.borrow_mut() = state.clone();
        self.pending.borrow_mut().push_back(state);

        // Emissions raised by an observer are delivered after the current one, in order.
        if self.dispatching.replace(true) {
            return;
        }
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(state) = next else {
                break;
            };
            self.observers.for_each_live(|observer| {
                if let Ok(mut observer) = observer.try_borrow_mut() {
                    (&mut *observer)(&state);
                }
            });
        }
        self.dispatching.set(false);
    }
}

impl<T> Clone for PaginatedSource<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for PaginatedSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatedSource")
            .field("loaded", &self.len())
            .field("has_more", &self.has_more())
            .field("loading", &self.is_loading())
            .field("pages", &self.pages_loaded())
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl<T: Clone + 'static> PagedData<PaginatedState<T>> for PaginatedSource<T> {
    fn snapshot(&self) -> PaginatedState<T> {
        self.state()
    }

    fn has_more(&self) -> bool {
        PaginatedSource::has_more(self)
    }

    fn load_more(&self) {
        PaginatedSource::load_more(self)
    }

    fn subscribe(&self, observer: Box<dyn FnMut(&PaginatedState<T>)>) -> Subscription {
        self.observe(observer)
    }

    fn progress(&self, snapshot: &PaginatedState<T>) -> PageProgress {
        snapshot.progress()
    }
}

/// Resolves one outstanding page request.
///
/// Exactly one of [`finish`](Self::finish) or [`fail`](Self::fail) should be called. Dropping
/// an unresolved completion counts as a failure. Completions outliving their source, or
/// belonging to a superseded request, are ignored.
#[must_use = "an unresolved PageCompletion fails the request when dropped"]
pub struct PageCompletion<T> {
    source: Weak<SourceInner<T>>,
    ticket: u64,
    settled: bool,
}

impl<T: Clone> PageCompletion<T> {
    /// Appends `page` and emits the resulting state.
    pub fn finish(mut self, page: Page<T>) {
        self.settled = true;
        let Some(inner) = self.source.upgrade() else {
            ptrace!("PageCompletion::finish: source dropped");
            return;
        };
        if !inner.settle(self.ticket) {
            return;
        }
        inner.pages.set(inner.pages.get().saturating_add(1));
        let next = inner.state.borrow().append(page.items, page.has_more);
        pdebug!(
            page = next.page().len(),
            loaded = next.len(),
            has_more = next.has_more(),
            "PaginatedSource: page loaded"
        );
        inner.emit(next);
    }
}

impl<T> PageCompletion<T> {
    /// Abandons the request without emitting a state. `has_more` and the loaded items are left
    /// untouched and a later `load_more` may retry.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn fail(mut self, reason: impl fmt::Display) {
        self.settled = true;
        let Some(inner) = self.source.upgrade() else {
            return;
        };
        if inner.settle(self.ticket) {
            pwarn!(ticket = self.ticket, %reason, "PaginatedSource: page load failed");
        }
    }

    /// `true` while the source is alive and still waiting for this completion.
    pub fn is_pending(&self) -> bool {
        self.source
            .upgrade()
            .is_some_and(|inner| inner.in_flight.get() == Some(self.ticket))
    }
}

impl<T> Drop for PageCompletion<T> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Some(inner) = self.source.upgrade() {
            if inner.settle(self.ticket) {
                pwarn!(ticket = self.ticket, "PaginatedSource: page request abandoned");
            }
        }
    }
}

impl<T> fmt::Debug for PageCompletion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCompletion")
            .field("ticket", &self.ticket)
            .field("pending", &self.is_pending())
            .finish()
    }
}
