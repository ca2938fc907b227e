use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};
use core::fmt;

use pagefill::{
    FillOutcome, FillPhase, FillProgress, LifecycleScope, ObserverKey, PageCursor, PagedData,
    ScrollTrigger, Subscription,
};

use crate::{
    AdapterOptions, ItemAdapter, LayoutListener, ScrollListener, ScrollPhase, ScrollableView,
};

/// How a sub-list turns its data into items: counting, extracting and binding them.
///
/// `D` is the sub-list data (a snapshot), `I` one item and `H` the host's item holder.
pub struct ItemBinding<D, I, H> {
    item_count: Rc<dyn Fn(&D) -> usize>,
    item_data: Rc<dyn Fn(&D, usize) -> I>,
    item_view_holder: Rc<dyn Fn() -> H>,
    item_binder: Rc<dyn Fn(&mut H, &I)>,
}

impl<D, I, H> ItemBinding<D, I, H> {
    pub fn new(
        item_count: impl Fn(&D) -> usize + 'static,
        item_data: impl Fn(&D, usize) -> I + 'static,
        item_view_holder: impl Fn() -> H + 'static,
    ) -> Self {
        Self {
            item_count: Rc::new(item_count),
            item_data: Rc::new(item_data),
            item_view_holder: Rc::new(item_view_holder),
            item_binder: Rc::new(|_, _| {}),
        }
    }

    /// Sets the function that fills a holder with one item.
    pub fn with_item_binder(mut self, binder: impl Fn(&mut H, &I) + 'static) -> Self {
        self.item_binder = Rc::new(binder);
        self
    }

    pub fn item_count(&self, data: &D) -> usize {
        (self.item_count)(data)
    }

    pub fn item_data(&self, data: &D, position: usize) -> I {
        (self.item_data)(data, position)
    }
}

impl<D, I, H> Clone for ItemBinding<D, I, H> {
    fn clone(&self) -> Self {
        Self {
            item_count: Rc::clone(&self.item_count),
            item_data: Rc::clone(&self.item_data),
            item_view_holder: Rc::clone(&self.item_view_holder),
            item_binder: Rc::clone(&self.item_binder),
        }
    }
}

impl<D, I, H> fmt::Debug for ItemBinding<D, I, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemBinding").finish_non_exhaustive()
    }
}

/// The item adapter of one sub-list.
///
/// Renders the most recent snapshot it received. When backed by a [`PagedData`] source and
/// attached to a view it:
///
/// - inserts each newly loaded page at the positions reported by its [`PageCursor`], ignoring
///   stale and no-op emissions
/// - runs the auto-fill loop: keeps requesting pages while the source has more and the last
///   completely visible position keeps advancing
/// - requests a page whenever a scroll state change finds the offset past the configured
///   threshold of the scrollable range
///
/// All registrations made by [`attach`](Self::attach) are released by
/// [`detach`](Self::detach), exactly once.
pub struct SubListAdapter<V: ScrollableView, D, I> {
    this: Weak<Self>,
    data: D,
    current: RefCell<Option<D>>,
    binding: ItemBinding<D, I, V::ItemHolder>,
    source: Option<Rc<dyn PagedData<D>>>,
    trigger: ScrollTrigger,
    initial_fill: bool,
    view: RefCell<Option<Rc<V>>>,
    cursor: Cell<PageCursor>,
    fill: Cell<FillProgress>,
    attached: Cell<bool>,
    scope: RefCell<LifecycleScope>,
    layout_listener: Rc<Cell<Option<ObserverKey>>>,
}

impl<V, D, I> SubListAdapter<V, D, I>
where
    V: ScrollableView + 'static,
    D: Clone + 'static,
    I: 'static,
{
    /// `data` is what the adapter renders until the source emits; for paginated content it is
    /// the source snapshot taken at bind time.
    pub fn new(
        data: D,
        binding: ItemBinding<D, I, V::ItemHolder>,
        source: Option<Rc<dyn PagedData<D>>>,
        options: &AdapterOptions,
    ) -> Rc<Self> {
        let cursor = match &source {
            Some(source) => PageCursor::from_progress(source.progress(&data)),
            None => PageCursor::new(binding.item_count(&data), false),
        };
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            data,
            current: RefCell::new(None),
            binding,
            source,
            trigger: options.scroll_trigger(),
            initial_fill: options.initial_fill,
            view: RefCell::new(None),
            cursor: Cell::new(cursor),
            fill: Cell::new(FillProgress::NotStarted),
            attached: Cell::new(false),
            scope: RefCell::new(LifecycleScope::new()),
            layout_listener: Rc::new(Cell::new(None)),
        })
    }

    /// Starts observing the source and arms the auto-fill loop and the scroll trigger on
    /// `view`. Static sub-lists only remember the view.
    ///
    /// Attaching an attached adapter detaches it first.
    pub fn attach(&self, view: &Rc<V>) {
        self.detach();
        pdebug!(paginated = self.source.is_some(), "SubListAdapter::attach");

        drop(self.scope.replace(LifecycleScope::new()));
        *self.view.borrow_mut() = Some(Rc::clone(view));
        self.attached.set(true);
        self.fill.set(FillProgress::NotStarted);

        let Some(source) = self.source.clone() else {
            return;
        };

        let this = self.this.clone();
        self.hold(source.subscribe(Box::new(move |state: &D| {
            if let Some(adapter) = this.upgrade() {
                adapter.on_state(state);
            }
        })));
        self.hold(self.arm_scroll_trigger(view));

        if !self.initial_fill {
            self.fill.set(FillProgress::Complete(FillOutcome::Saturated));
            return;
        }

        pdebug!("SubListAdapter: initial fill begin");
        source.load_more();
        if !self.attached.get() {
            return;
        }
        self.hold(self.arm_first_layout(view));
    }

    fn hold(&self, subscription: Subscription) {
        self.scope.borrow().add(subscription);
    }

    fn arm_scroll_trigger(&self, view: &Rc<V>) -> Subscription {
        let listener = Rc::new(ScrollTriggerListener {
            adapter: self.this.clone(),
        });
        let key = view.add_scroll_listener(listener);
        let view = Rc::downgrade(view);
        Subscription::new(move || {
            if let Some(view) = view.upgrade() {
                view.remove_scroll_listener(key);
            }
        })
    }

    fn arm_first_layout(&self, view: &Rc<V>) -> Subscription {
        let listener = Rc::new(FirstLayoutListener {
            adapter: self.this.clone(),
        });
        self.layout_listener.set(Some(view.add_layout_listener(listener)));
        let slot = Rc::clone(&self.layout_listener);
        let view = Rc::downgrade(view);
        Subscription::new(move || {
            if let (Some(key), Some(view)) = (slot.take(), view.upgrade()) {
                view.remove_layout_listener(key);
            }
        })
    }

    fn on_state(&self, state: &D) {
        let Some(source) = self.source.clone() else {
            return;
        };
        if !self.attached.get() {
            return;
        }
        let mut cursor = self.cursor.get();
        let accepted = cursor.accept(source.progress(state));
        self.cursor.set(cursor);
        let Some(inserted) = accepted else {
            ptrace!("SubListAdapter: emission ignored");
            return;
        };

        *self.current.borrow_mut() = Some(state.clone());
        if !inserted.is_empty() {
            pdebug!(
                start = inserted.start,
                count = inserted.len(),
                "SubListAdapter: notify item range inserted"
            );
            if let Some(view) = self.view() {
                view.notify_item_range_inserted(inserted.start, inserted.len());
            }
        }

        self.continue_fill(&*source);
    }

    fn continue_fill(&self, source: &dyn PagedData<D>) {
        let mut fill = self.fill.get();
        if fill.is_complete() || !self.attached.get() {
            return;
        }
        let last_visible = self
            .view()
            .and_then(|view| view.layout_manager())
            .and_then(|layout| layout.find_last_completely_visible_item_position());
        let load = fill.advance(source.has_more(), last_visible);
        self.fill.set(fill);

        if load {
            pdebug!(?last_visible, "SubListAdapter: initial fill across");
            source.load_more();
        } else {
            pdebug!(?fill, "SubListAdapter: initial fill complete");
        }
    }

    fn on_first_layout(&self) {
        let Some(key) = self.layout_listener.take() else {
            return;
        };
        if let Some(view) = self.view() {
            view.remove_layout_listener(key);
        }
        if !self.attached.get() {
            return;
        }
        if let Some(source) = &self.source {
            pdebug!("SubListAdapter: initial fill on first layout");
            source.load_more();
        }
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn on_scroll_state_changed(&self, phase: ScrollPhase) {
        if !self.attached.get() {
            return;
        }
        let (Some(source), Some(view)) = (&self.source, self.view()) else {
            return;
        };
        let metrics = view.horizontal_scroll_metrics();
        if self.trigger.should_load(metrics) {
            pdebug!(
                ?phase,
                offset = metrics.offset,
                range = metrics.scrollable_range(),
                "SubListAdapter: scroll trigger load"
            );
            source.load_more();
        }
    }
}

impl<V: ScrollableView, D, I> SubListAdapter<V, D, I> {
    /// Releases every registration made by [`attach`](Self::attach). Idempotent.
    pub fn detach(&self) {
        if !self.attached.replace(false) {
            return;
        }
        pdebug!("SubListAdapter::detach");
        self.scope.borrow().close();
        let view = self.view.borrow_mut().take();
        drop(view);
    }

    fn view(&self) -> Option<Rc<V>> {
        self.view.borrow().clone()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    pub fn is_paginated(&self) -> bool {
        self.source.is_some()
    }

    pub fn fill_progress(&self) -> FillProgress {
        self.fill.get()
    }

    /// The observable fill phase. `Idle` while detached or for static data.
    pub fn phase(&self) -> FillPhase {
        let Some(source) = self.source.as_ref().filter(|_| self.attached.get()) else {
            return FillPhase::Idle;
        };
        match self.fill.get() {
            FillProgress::Complete(FillOutcome::Saturated) if !source.has_more() => {
                FillPhase::FillComplete
            }
            fill => FillPhase::of(fill),
        }
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor.get()
    }

    /// Runs `f` with the data currently rendered.
    pub fn with_data<R>(&self, f: impl FnOnce(&D) -> R) -> R {
        let current = self.current.borrow();
        f(current.as_ref().unwrap_or(&self.data))
    }
}

impl<V: ScrollableView, D, I> ItemAdapter<V::ItemHolder> for SubListAdapter<V, D, I> {
    fn item_count(&self) -> usize {
        self.with_data(|data| self.binding.item_count(data))
    }

    fn create_view_holder(&self) -> V::ItemHolder {
        (self.binding.item_view_holder)()
    }

    fn bind_view_holder(&self, holder: &mut V::ItemHolder, position: usize) {
        ptrace!(position, "SubListAdapter::bind_view_holder");
        let item = self.with_data(|data| self.binding.item_data(data, position));
        (self.binding.item_binder)(holder, &item);
    }
}

impl<V: ScrollableView, D, I> fmt::Debug for SubListAdapter<V, D, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubListAdapter")
            .field("attached", &self.attached.get())
            .field("paginated", &self.source.is_some())
            .field("cursor", &self.cursor.get())
            .field("fill", &self.fill.get())
            .finish()
    }
}

struct ScrollTriggerListener<V: ScrollableView, D, I> {
    adapter: Weak<SubListAdapter<V, D, I>>,
}

impl<V, D, I> ScrollListener for ScrollTriggerListener<V, D, I>
where
    V: ScrollableView + 'static,
    D: Clone + 'static,
    I: 'static,
{
    fn on_scroll_state_changed(&self, phase: ScrollPhase) {
        if let Some(adapter) = self.adapter.upgrade() {
            adapter.on_scroll_state_changed(phase);
        }
    }
}

struct FirstLayoutListener<V: ScrollableView, D, I> {
    adapter: Weak<SubListAdapter<V, D, I>>,
}

impl<V, D, I> LayoutListener for FirstLayoutListener<V, D, I>
where
    V: ScrollableView + 'static,
    D: Clone + 'static,
    I: 'static,
{
    fn on_layout_change(&self) {
        if let Some(adapter) = self.adapter.upgrade() {
            adapter.on_first_layout();
        }
    }
}
