//! In-memory host implementations of [`ScrollableView`] and [`LayoutManager`].
//!
//! Useful for tests, simulations and hosts that compute layout themselves. Items have a fixed
//! extent along the horizontal axis.
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::ops::Range;

use pagefill::{ObserverKey, ObserverList, ScrollMetrics};

use crate::{
    ItemAdapter, LayoutKind, LayoutListener, LayoutManager, LayoutState, Orientation,
    ScrollListener, ScrollPhase, ScrollableView,
};

/// A linear layout of fixed-extent items.
pub struct HeadlessLinearLayout {
    kind: LayoutKind,
    orientation: Orientation,
    item_extent: u32,
    viewport: Cell<u32>,
    offset: Cell<u32>,
    item_count: Cell<usize>,
    pending: Cell<Option<LayoutState>>,
}

impl HeadlessLinearLayout {
    /// `item_extent` is clamped to at least 1.
    pub fn new(orientation: Orientation, item_extent: u32, viewport: u32) -> Self {
        Self {
            kind: LayoutKind::Linear,
            orientation,
            item_extent: item_extent.max(1),
            viewport: Cell::new(viewport),
            offset: Cell::new(0),
            item_count: Cell::new(0),
            pending: Cell::new(None),
        }
    }

    pub fn horizontal(item_extent: u32, viewport: u32) -> Self {
        Self::new(Orientation::Horizontal, item_extent, viewport)
    }

    /// Reports `kind` instead of [`LayoutKind::Linear`]. The geometry stays linear.
    pub fn with_kind(mut self, kind: LayoutKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn item_extent(&self) -> u32 {
        self.item_extent
    }

    pub fn viewport(&self) -> u32 {
        self.viewport.get()
    }

    pub fn set_viewport(&self, viewport: u32) {
        self.viewport.set(viewport);
        self.offset.set(self.clamp_offset(self.offset.get()));
    }

    pub fn offset(&self) -> u32 {
        self.offset.get()
    }

    /// Item count of the last layout pass.
    pub fn item_count(&self) -> usize {
        self.item_count.get()
    }

    /// A state handed to `restore_state` and not yet applied by a layout pass.
    pub fn pending_state(&self) -> Option<LayoutState> {
        self.pending.get()
    }

    /// Positions intersecting the viewport.
    pub fn visible_range(&self) -> Range<usize> {
        let count = self.item_count.get();
        if count == 0 {
            return 0..0;
        }
        let extent = u64::from(self.item_extent);
        let start = u64::from(self.offset.get());
        let end = start + u64::from(self.viewport.get());
        let first = to_index(start / extent).min(count);
        let last = to_index(end.div_ceil(extent)).min(count);
        first..last
    }

    fn content_size(&self) -> u32 {
        let size = u64::from(self.item_extent) * self.item_count.get() as u64;
        u32::try_from(size).unwrap_or(u32::MAX)
    }

    fn clamp_offset(&self, offset: u32) -> u32 {
        offset.min(self.content_size().saturating_sub(self.viewport.get()))
    }

    fn first_visible(&self) -> Option<usize> {
        let range = self.visible_range();
        (!range.is_empty()).then_some(range.start)
    }
}

fn to_index(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

impl LayoutManager for HeadlessLinearLayout {
    fn kind(&self) -> LayoutKind {
        self.kind
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn find_last_completely_visible_item_position(&self) -> Option<usize> {
        let count = self.item_count.get();
        if count == 0 {
            return None;
        }
        let extent = u64::from(self.item_extent);
        let start = u64::from(self.offset.get());
        let end = start + u64::from(self.viewport.get());
        let first_complete = to_index(start.div_ceil(extent));
        let end_complete = to_index(end / extent).min(count);
        (end_complete > first_complete).then(|| end_complete - 1)
    }

    fn compute_scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            offset: self.offset.get(),
            range: self.content_size(),
            extent: self.viewport.get(),
        }
    }

    fn on_layout_children(&self, item_count: usize) {
        self.item_count.set(item_count);
        let mut offset = self.offset.get();
        if let Some(state) = self.pending.take() {
            offset = match state.anchor_position {
                Some(anchor) => {
                    let start = i64::from(self.item_extent) * anchor as i64;
                    let restored = start - i64::from(state.anchor_offset);
                    u32::try_from(restored.max(0)).unwrap_or(u32::MAX)
                }
                None => 0,
            };
        }
        self.offset.set(self.clamp_offset(offset));
    }

    fn scroll_to_offset(&self, offset: u32) -> u32 {
        let offset = self.clamp_offset(offset);
        self.offset.set(offset);
        offset
    }

    fn save_state(&self) -> Option<LayoutState> {
        if let Some(pending) = self.pending.get() {
            return Some(pending);
        }
        let Some(anchor) = self.first_visible() else {
            return Some(LayoutState::default());
        };
        let start = i64::from(self.item_extent) * anchor as i64;
        let offset = start - i64::from(self.offset.get());
        Some(LayoutState {
            anchor_position: Some(anchor),
            anchor_offset: i32::try_from(offset).unwrap_or(i32::MIN),
        })
    }

    fn restore_state(&self, state: &LayoutState) {
        self.pending.set(Some(*state));
    }
}

impl fmt::Debug for HeadlessLinearLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessLinearLayout")
            .field("kind", &self.kind)
            .field("orientation", &self.orientation)
            .field("item_extent", &self.item_extent)
            .field("viewport", &self.viewport.get())
            .field("offset", &self.offset.get())
            .field("item_count", &self.item_count.get())
            .finish()
    }
}

/// A scrollable view without a screen.
///
/// The host drives it explicitly: [`layout`](Self::layout) runs a layout pass and notifies
/// layout listeners, [`scroll_to`](Self::scroll_to) and [`fling_to`](Self::fling_to) move the
/// content and report scroll state changes. Visible items are bound into holders of type `H`.
pub struct HeadlessView<H> {
    item_extent: u32,
    viewport: u32,
    adapter: RefCell<Option<Rc<dyn ItemAdapter<H>>>>,
    layout_manager: RefCell<Option<Rc<dyn LayoutManager>>>,
    scroll_listeners: ObserverList<dyn ScrollListener>,
    layout_listeners: ObserverList<dyn LayoutListener>,
    holders: RefCell<Vec<(usize, H)>>,
    inserted: RefCell<Vec<Range<usize>>>,
    layout_passes: Cell<usize>,
}

impl<H> HeadlessView<H> {
    /// `item_extent` and `viewport` size the layout managers this view creates.
    pub fn new(item_extent: u32, viewport: u32) -> Self {
        Self {
            item_extent,
            viewport,
            adapter: RefCell::new(None),
            layout_manager: RefCell::new(None),
            scroll_listeners: ObserverList::new(),
            layout_listeners: ObserverList::new(),
            holders: RefCell::new(Vec::new()),
            inserted: RefCell::new(Vec::new()),
            layout_passes: Cell::new(0),
        }
    }

    fn adapter(&self) -> Option<Rc<dyn ItemAdapter<H>>> {
        self.adapter.borrow().clone()
    }

    fn current_layout(&self) -> Option<Rc<dyn LayoutManager>> {
        self.layout_manager.borrow().clone()
    }

    pub fn has_adapter(&self) -> bool {
        self.adapter.borrow().is_some()
    }

    /// Item count reported by the adapter, 0 without one.
    pub fn item_count(&self) -> usize {
        self.adapter().map_or(0, |adapter| adapter.item_count())
    }

    /// Runs a layout pass, rebinds visible items and notifies layout listeners.
    pub fn layout(&self) {
        let count = self.item_count();
        if let Some(layout) = self.current_layout() {
            layout.on_layout_children(count);
        }
        self.bind_visible();
        self.layout_passes.set(self.layout_passes.get() + 1);
        self.layout_listeners.for_each_live(|l| l.on_layout_change());
    }

    /// A drag to `offset`: `Dragging`, move, `Idle`.
    pub fn scroll_to(&self, offset: u32) {
        self.move_to(offset, ScrollPhase::Dragging);
    }

    /// A fling to `offset`: `Settling`, move, `Idle`.
    pub fn fling_to(&self, offset: u32) {
        self.move_to(offset, ScrollPhase::Settling);
    }

    fn move_to(&self, offset: u32, phase: ScrollPhase) {
        self.dispatch_scroll(phase);
        if let Some(layout) = self.current_layout() {
            layout.scroll_to_offset(offset);
        }
        self.bind_visible();
        self.dispatch_scroll(ScrollPhase::Idle);
    }

    fn dispatch_scroll(&self, phase: ScrollPhase) {
        self.scroll_listeners
            .for_each_live(|l| l.on_scroll_state_changed(phase));
    }

    fn bind_visible(&self) {
        let Some(adapter) = self.adapter() else {
            self.holders.borrow_mut().clear();
            return;
        };
        let count = adapter.item_count();
        let positions = match self.current_layout() {
            Some(layout) => {
                let metrics = layout.compute_scroll_metrics();
                let extent = u64::from(self.item_extent.max(1));
                let start = u64::from(metrics.offset);
                let end = start + u64::from(metrics.extent);
                let first = to_index(start / extent).min(count);
                let last = to_index(end.div_ceil(extent)).min(count);
                first..last
            }
            None => 0..0,
        };
        let holders: Vec<(usize, H)> = positions
            .map(|position| {
                let mut holder = adapter.create_view_holder();
                adapter.bind_view_holder(&mut holder, position);
                (position, holder)
            })
            .collect();
        *self.holders.borrow_mut() = holders;
    }

    pub fn offset(&self) -> u32 {
        self.current_layout()
            .map_or(0, |layout| layout.compute_scroll_metrics().offset)
    }

    /// Positions bound by the last layout or scroll.
    pub fn bound_positions(&self) -> Vec<usize> {
        self.holders.borrow().iter().map(|(p, _)| *p).collect()
    }

    /// Runs `f` over the bound holders, in position order.
    pub fn with_holders<R>(&self, f: impl FnOnce(&[(usize, H)]) -> R) -> R {
        f(&self.holders.borrow())
    }

    /// Every `notify_item_range_inserted` received, in order.
    pub fn inserted(&self) -> Vec<Range<usize>> {
        self.inserted.borrow().clone()
    }

    pub fn layout_passes(&self) -> usize {
        self.layout_passes.get()
    }

    pub fn scroll_listener_count(&self) -> usize {
        self.scroll_listeners.len()
    }

    pub fn layout_listener_count(&self) -> usize {
        self.layout_listeners.len()
    }
}

impl<H: 'static> ScrollableView for HeadlessView<H> {
    type ItemHolder = H;

    fn set_adapter(&self, adapter: Option<Rc<dyn ItemAdapter<H>>>) {
        *self.adapter.borrow_mut() = adapter;
        self.holders.borrow_mut().clear();
    }

    fn set_layout_manager(&self, layout: Rc<dyn LayoutManager>) {
        *self.layout_manager.borrow_mut() = Some(layout);
    }

    fn layout_manager(&self) -> Option<Rc<dyn LayoutManager>> {
        self.current_layout()
    }

    fn create_linear_layout_manager(&self, orientation: Orientation) -> Rc<dyn LayoutManager> {
        Rc::new(HeadlessLinearLayout::new(
            orientation,
            self.item_extent,
            self.viewport,
        ))
    }

    fn add_scroll_listener(&self, listener: Rc<dyn ScrollListener>) -> ObserverKey {
        self.scroll_listeners.add(listener)
    }

    fn remove_scroll_listener(&self, key: ObserverKey) {
        self.scroll_listeners.remove(key);
    }

    fn add_layout_listener(&self, listener: Rc<dyn LayoutListener>) -> ObserverKey {
        self.layout_listeners.add(listener)
    }

    fn remove_layout_listener(&self, key: ObserverKey) {
        self.layout_listeners.remove(key);
    }

    fn notify_item_range_inserted(&self, start: usize, count: usize) {
        self.inserted.borrow_mut().push(start..start + count);
    }
}

impl<H> fmt::Debug for HeadlessView<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessView")
            .field("item_extent", &self.item_extent)
            .field("viewport", &self.viewport)
            .field("has_adapter", &self.has_adapter())
            .field("bound", &self.bound_positions())
            .field("inserted", &self.inserted.borrow().len())
            .field("layout_passes", &self.layout_passes.get())
            .finish()
    }
}
