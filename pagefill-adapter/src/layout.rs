use pagefill::ScrollMetrics;

use crate::{Error, LayoutState, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// The family a [`LayoutManager`] belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutKind {
    Linear,
    /// A grid lays items out in linear order along its scroll axis.
    Grid { spans: u32 },
    StaggeredGrid { spans: u32 },
    /// Any other host layout, identified by name.
    Custom(&'static str),
}

impl LayoutKind {
    /// `true` for layouts that place item `n + 1` after item `n` along the scroll axis.
    pub fn is_linear(&self) -> bool {
        matches!(self, Self::Linear | Self::Grid { .. })
    }
}

/// A host layout manager, as seen by the sub-list adapter.
pub trait LayoutManager {
    fn kind(&self) -> LayoutKind;

    fn orientation(&self) -> Orientation;

    /// The last adapter position whose item is completely inside the viewport.
    fn find_last_completely_visible_item_position(&self) -> Option<usize>;

    fn compute_scroll_metrics(&self) -> ScrollMetrics;

    /// Lays out `item_count` items. A state passed to [`restore_state`](Self::restore_state)
    /// beforehand is applied here.
    fn on_layout_children(&self, item_count: usize);

    /// Moves the scroll offset, clamped to the scrollable range. Returns the applied offset.
    fn scroll_to_offset(&self, offset: u32) -> u32;

    fn save_state(&self) -> Option<LayoutState>;

    fn restore_state(&self, state: &LayoutState);
}

/// Rejects layout managers that cannot drive a paginated sub-list.
///
/// Static data accepts any layout.
pub fn check_layout_manager(layout: &dyn LayoutManager, paginated: bool) -> Result<()> {
    if !paginated {
        return Ok(());
    }
    let kind = layout.kind();
    let orientation = layout.orientation();
    if kind.is_linear() && orientation == Orientation::Horizontal {
        return Ok(());
    }
    pwarn!(?kind, ?orientation, "incompatible layout manager for paginated data");
    Err(Error::IncompatibleLayoutManager { kind, orientation })
}
