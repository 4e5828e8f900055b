#![forbid(unsafe_code)]

//! Observable ordered collections for FrankenTUI.
//!
//! This crate provides change-notifying lists and live derived views over
//! them, for binding list widgets to data that changes underneath:
//!
//! - [`ObservableVec`]: a shared, mutable list that reports every mutation
//!   as a [`ListChange`].
//! - [`SortedVec`] / [`SortedObservableVec`]: lists kept in comparer order,
//!   with batched merge insertion and in-place re-sort of a mutated element.
//! - [`FilteredView`], [`ConvertedView`], [`ReverseView`], [`RangeView`]:
//!   derived views that stay equal to a function of their source by
//!   translating each source change, without re-reading the source.
//! - [`search`]: binary search over ordered slices.
//!
//! # Architecture
//!
//! Lists are `Rc` handles over `RefCell` state, so clones share contents.
//! Each list owns a [`Subscribers`] registry of `Weak` callbacks; the
//! [`Subscription`] guard keeps a callback alive. Notification is
//! synchronous and happens after the mutation is complete.
//!
//! # Invariants
//!
//! 1. Replaying the changes a list sends, in order, onto a copy of its old
//!    contents yields its new contents.
//! 2. A derived view always equals its function of the source's contents.
//! 3. A sorted list is ordered by its comparer after every public call.
//! 4. A failing mutator changes nothing and notifies nobody.
//!
//! # Feature flags
//!
//! - `tracing`: emit `collections.*` events for bulk operations and view
//!   resyncs.

pub mod change;
pub mod converted;
pub mod error;
pub mod filtered;
pub mod observable_vec;
pub mod range;
pub mod reverse;
pub mod search;
pub mod sorted;
pub mod sorted_observable;

pub use change::{
    ChangeAction, ChangeCallback, ListChange, ListMut, ObservableList, Subscribers, Subscription,
};
pub use converted::ConvertedView;
pub use error::{CollectionError, Result};
pub use filtered::{Filter, FilteredView};
pub use observable_vec::ObservableVec;
pub use range::RangeView;
pub use reverse::ReverseView;
pub use search::{binary_search, binary_search_by, binary_search_by_key, binary_search_with};
pub use sorted::{Comparer, SortedVec};
pub use sorted_observable::SortedObservableVec;
