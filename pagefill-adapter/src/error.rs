use crate::{LayoutKind, Orientation};

/// Setup failures. These are developer-facing contract violations and are reported
/// synchronously from bind/build, never from the asynchronous fetch path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Paginated data was bound to a layout manager other than a horizontal linear one.
    #[error(
        "paginated data requires a linear layout manager in horizontal orientation, \
         found {kind:?} in {orientation:?} orientation"
    )]
    IncompatibleLayoutManager {
        kind: LayoutKind,
        orientation: Orientation,
    },

    /// The default view holder was requested without a view factory.
    #[error("a view factory is required with the default sub-list view holder")]
    MissingViewFactory,
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
