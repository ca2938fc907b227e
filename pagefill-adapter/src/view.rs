use alloc::rc::Rc;

use pagefill::{ObserverKey, ScrollMetrics};

use crate::{LayoutManager, Orientation};

/// Scroll state reported to [`ScrollListener`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollPhase {
    Idle,
    /// The user is dragging the content.
    Dragging,
    /// The content is moving on its own (fling or programmatic smooth scroll).
    Settling,
}

pub trait ScrollListener {
    fn on_scroll_state_changed(&self, phase: ScrollPhase);
}

pub trait LayoutListener {
    fn on_layout_change(&self);
}

/// The item-level adapter a [`ScrollableView`] renders.
pub trait ItemAdapter<H> {
    fn item_count(&self) -> usize;

    fn create_view_holder(&self) -> H;

    fn bind_view_holder(&self, holder: &mut H, position: usize);
}

/// A host's scrollable list view that can render a sub-list.
///
/// Listener registration returns a key; removing an unknown key is a no-op.
pub trait ScrollableView {
    /// The holder type for one item of the sub-list.
    type ItemHolder;

    fn set_adapter(&self, adapter: Option<Rc<dyn ItemAdapter<Self::ItemHolder>>>);

    fn set_layout_manager(&self, layout: Rc<dyn LayoutManager>);

    fn layout_manager(&self) -> Option<Rc<dyn LayoutManager>>;

    /// Builds the host's linear layout manager. Used when no layout manager factory is
    /// configured.
    fn create_linear_layout_manager(&self, orientation: Orientation) -> Rc<dyn LayoutManager>;

    /// Scroll geometry along the horizontal axis.
    fn horizontal_scroll_metrics(&self) -> ScrollMetrics {
        self.layout_manager()
            .map(|layout| layout.compute_scroll_metrics())
            .unwrap_or_default()
    }

    fn add_scroll_listener(&self, listener: Rc<dyn ScrollListener>) -> ObserverKey;

    fn remove_scroll_listener(&self, key: ObserverKey);

    fn add_layout_listener(&self, listener: Rc<dyn LayoutListener>) -> ObserverKey;

    fn remove_layout_listener(&self, key: ObserverKey);

    /// Items `start..start + count` were inserted into the adapter.
    fn notify_item_range_inserted(&self, start: usize, count: usize);
}
