//! A headless paginated incremental-fill engine.
//!
//! For binding the engine to a scrollable view (sub-list adapter, scroll memento, content
//! descriptions), see the `pagefill-adapter` crate.
//!
//! This crate focuses on the state that drives "load the next page" decisions for nested
//! carousels and other horizontally scrolling sub-lists:
//! - append-only snapshots of loaded data ([`PaginatedState`]) and the accept filter that
//!   turns them into position-stable inserts ([`PageCursor`])
//! - a data source with at-most-one fetch in flight ([`PaginatedSource`])
//! - the auto-fill decision function and the scroll trigger ([`decide_fill`], [`ScrollTrigger`])
//! - subscription handles and lifecycle scopes that release work exactly once
//!
//! It is UI-agnostic and single-threaded. A host is expected to deliver fetch completions,
//! layout passes and scroll events serially on its UI loop.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod fill;
mod lifecycle;
mod observers;
mod source;
mod state;
mod subscription;


pub use fill::{
    DEFAULT_LOAD_MORE_THRESHOLD, FillDecision, FillOutcome, FillPhase, FillProgress,
    ScrollMetrics, ScrollTrigger, decide_fill,
};
pub use lifecycle::{Lifecycle, LifecycleObserver, LifecycleOwner};
pub use observers::{ObserverKey, ObserverList};
pub use source::{Page, PageCompletion, PageLoader, PageRequest, PagedData, PaginatedSource};
pub use state::{PageCursor, PageProgress, PaginatedState};
pub use subscription::{LifecycleScope, Subscription};
