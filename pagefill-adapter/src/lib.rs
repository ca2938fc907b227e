//! Sub-list adapter utilities for the `pagefill` crate.
//!
//! The `pagefill` crate is UI-agnostic and owns the pagination state and decisions. This crate
//! binds it to a host's scrollable view:
//!
//! - [`SubListAdapter`]: renders the current snapshot, inserts arriving pages at stable
//!   positions, runs the initial auto-fill loop and the scroll trigger
//! - [`ScrollMemento`] / [`DescriptionCache`]: scroll position saved on teardown and restored
//!   before the next bind
//! - [`SubListViewHolder`]: ties a bound sub-list to the owning screen's lifecycle
//! - [`SubListContent`] / [`ContentDescription`]: the factory a content-assembly layer uses
//!   to place a sub-list (e.g. a carousel) into a host list
//!
//! Host views and layout managers plug in through [`ScrollableView`] and [`LayoutManager`].
//! The [`headless`] module provides in-memory implementations of both.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod adapter;
mod content;
mod error;
pub mod headless;
mod holder;
mod layout;
mod memento;
mod options;
mod view;

#[cfg(test)]
mod tests;

pub use adapter::{ItemBinding, SubListAdapter};
pub use content::{ContentData, ContentDescription, SubListContent};
pub use error::{Error, Result};
pub use holder::{ContentViewHolder, HolderConfig, SubListViewHolder};
pub use layout::{LayoutKind, LayoutManager, Orientation, check_layout_manager};
pub use memento::{DEFAULT_STATE_CACHE_KEY, DescriptionCache, LayoutState, ScrollMemento};
pub use options::AdapterOptions;
pub use view::{ItemAdapter, LayoutListener, ScrollListener, ScrollPhase, ScrollableView};
