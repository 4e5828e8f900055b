#![forbid(unsafe_code)]

//! Change notifications and the observable-list contract.
//!
//! Every list in this crate describes each mutation as a [`ListChange`] and
//! delivers it synchronously to its subscribers before the mutator returns.
//! Replaying the delivered changes, in order, onto a copy of the old contents
//! (see [`ListChange::apply_to`]) reproduces the new contents exactly.
//!
//! # Dispatch model
//!
//! - Subscribers are notified in registration order.
//! - Callbacks are held as `Weak` pointers; the [`Subscription`] guard owns
//!   the only strong reference, so dropping it unsubscribes. Dead entries are
//!   pruned lazily during notification.
//! - No interior borrow is held while a callback runs, so a callback may read
//!   any list, including the one that is notifying.
//! - Batch mutators apply the whole batch, then deliver the full sequence of
//!   changes. Each change is expressed against the state produced by the
//!   changes before it in that sequence.
//!
//! # Reentrancy
//!
//! Mutating a list from inside one of its own notifications (directly, or
//! through a derived view's callback) is a precondition violation. Debug
//! builds assert on it.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::converted::ConvertedView;
use crate::error::{CollectionError, Result};
use crate::filtered::{Filter, FilteredView};
use crate::range::RangeView;
use crate::reverse::ReverseView;

/// Kind of a [`ListChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    Add,
    Remove,
    Replace,
    Move,
    Reset,
}

/// One structural mutation of an ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListChange<T> {
    /// `items` (non-empty) were inserted so the first lands at `index`.
    Add { index: usize, items: Vec<T> },
    /// `items` (non-empty) were removed starting at `index`.
    Remove { index: usize, items: Vec<T> },
    /// `old_items` at `index` were substituted in place by `new_items`
    /// (same length).
    Replace {
        index: usize,
        old_items: Vec<T>,
        new_items: Vec<T>,
    },
    /// The contiguous run `items` moved from `old_index` so that its first
    /// element now sits at `new_index`. Never emitted with equal indices.
    Move {
        old_index: usize,
        new_index: usize,
        items: Vec<T>,
    },
    /// Contents changed wholesale; observers must re-read the list.
    Reset,
}

impl<T> ListChange<T> {
    #[must_use]
    pub fn action(&self) -> ChangeAction {
        match self {
            Self::Add { .. } => ChangeAction::Add,
            Self::Remove { .. } => ChangeAction::Remove,
            Self::Replace { .. } => ChangeAction::Replace,
            Self::Move { .. } => ChangeAction::Move,
            Self::Reset => ChangeAction::Reset,
        }
    }

    /// Index the affected run occupied before the change.
    #[must_use]
    pub fn old_start_index(&self) -> Option<usize> {
        match self {
            Self::Remove { index, .. } | Self::Replace { index, .. } => Some(*index),
            Self::Move { old_index, .. } => Some(*old_index),
            Self::Add { .. } | Self::Reset => None,
        }
    }

    /// Index the affected run occupies after the change.
    #[must_use]
    pub fn new_start_index(&self) -> Option<usize> {
        match self {
            Self::Add { index, .. } | Self::Replace { index, .. } => Some(*index),
            Self::Move { new_index, .. } => Some(*new_index),
            Self::Remove { .. } | Self::Reset => None,
        }
    }

    #[must_use]
    pub fn old_items(&self) -> &[T] {
        match self {
            Self::Remove { items, .. } | Self::Move { items, .. } => items,
            Self::Replace { old_items, .. } => old_items,
            Self::Add { .. } | Self::Reset => &[],
        }
    }

    #[must_use]
    pub fn new_items(&self) -> &[T] {
        match self {
            Self::Add { items, .. } | Self::Move { items, .. } => items,
            Self::Replace { new_items, .. } => new_items,
            Self::Remove { .. } | Self::Reset => &[],
        }
    }

    /// Convert every payload element, keeping indices unchanged.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> ListChange<U> {
        let mut conv = |items: &[T]| items.iter().map(&mut f).collect::<Vec<U>>();
        match self {
            Self::Add { index, items } => ListChange::Add {
                index: *index,
                items: conv(items),
            },
            Self::Remove { index, items } => ListChange::Remove {
                index: *index,
                items: conv(items),
            },
            Self::Replace {
                index,
                old_items,
                new_items,
            } => ListChange::Replace {
                index: *index,
                old_items: conv(old_items),
                new_items: conv(new_items),
            },
            Self::Move {
                old_index,
                new_index,
                items,
            } => ListChange::Move {
                old_index: *old_index,
                new_index: *new_index,
                items: conv(items),
            },
            Self::Reset => ListChange::Reset,
        }
    }
}

impl<T> ListChange<T> {
    /// Check that this change can be applied to a list of length `len`.
    pub fn check_fits(&self, len: usize) -> Result<()> {
        match self {
            Self::Add { index, .. } => CollectionError::check_insert(*index, len),
            Self::Remove { index, items } => CollectionError::check_range(*index, items.len(), len),
            Self::Replace {
                index, new_items, ..
            } => CollectionError::check_range(*index, new_items.len(), len),
            Self::Move {
                old_index,
                new_index,
                items,
            } => {
                CollectionError::check_range(*old_index, items.len(), len)?;
                CollectionError::check_range(*new_index, items.len(), len)
            }
            Self::Reset => Ok(()),
        }
    }
}

impl<T: Clone> ListChange<T> {
    /// Replay this change onto `mirror`.
    ///
    /// Returns `Ok(false)` for [`ListChange::Reset`], leaving `mirror`
    /// untouched; the caller must rebuild it from the source. Fails without
    /// modifying `mirror` if the change does not fit its current length.
    pub fn apply_to(&self, mirror: &mut Vec<T>) -> Result<bool> {
        self.check_fits(mirror.len())?;
        match self {
            Self::Add { index, items } => {
                mirror.splice(*index..*index, items.iter().cloned());
            }
            Self::Remove { index, items } => {
                mirror.drain(*index..*index + items.len());
            }
            Self::Replace {
                index, new_items, ..
            } => {
                mirror[*index..*index + new_items.len()].clone_from_slice(new_items);
            }
            Self::Move {
                old_index,
                new_index,
                items,
            } => {
                let run: Vec<T> = mirror.drain(*old_index..*old_index + items.len()).collect();
                mirror.splice(*new_index..*new_index, run);
            }
            Self::Reset => return Ok(false),
        }
        Ok(true)
    }
}

/// Shared change callback.
pub type ChangeCallback<T> = dyn Fn(&ListChange<T>);

/// RAII guard for a change subscription.
///
/// Dropping the guard removes the callback before the next notification.
pub struct Subscription {
    _callback: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Ordered list of change callbacks owned by a list or view.
pub struct Subscribers<T> {
    entries: RefCell<Vec<Weak<ChangeCallback<T>>>>,
    depth: Cell<usize>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            depth: Cell::new(0),
        }
    }
}

impl<T> fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("registered", &self.entries.borrow().len())
            .field("dispatching", &(self.depth.get() > 0))
            .finish()
    }
}

struct DispatchGuard<'a>(&'a Cell<usize>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

impl<T: 'static> Subscribers<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback`; it stays registered while the returned guard lives.
    pub fn subscribe(&self, callback: Rc<ChangeCallback<T>>) -> Subscription {
        let mut entries = self.entries.borrow_mut();
        entries.retain(|w| w.strong_count() > 0);
        entries.push(Rc::downgrade(&callback));
        Subscription {
            _callback: Box::new(callback),
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a notification is currently being delivered.
    #[must_use]
    pub fn is_dispatching(&self) -> bool {
        self.depth.get() > 0
    }

    /// Assert the reentrancy precondition before a mutation.
    pub(crate) fn debug_assert_idle(&self) {
        debug_assert!(
            !self.is_dispatching(),
            "list mutated from inside its own change notification"
        );
    }

    /// Deliver `change` to every live subscriber, in registration order.
    pub fn notify(&self, change: &ListChange<T>) {
        let live: Vec<Rc<ChangeCallback<T>>> = {
            let mut entries = self.entries.borrow_mut();
            entries.retain(|w| w.strong_count() > 0);
            entries.iter().filter_map(Weak::upgrade).collect()
        };
        if live.is_empty() {
            return;
        }
        self.depth.set(self.depth.get() + 1);
        let _guard = DispatchGuard(&self.depth);
        for callback in live {
            callback(change);
        }
    }

    /// Deliver a sequence of changes in order.
    pub fn notify_all(&self, changes: &[ListChange<T>]) {
        for change in changes {
            self.notify(change);
        }
    }
}

/// A readable, change-notifying ordered sequence.
///
/// Implementors are cheap-to-clone handles; clones share contents and
/// subscribers.
pub trait ObservableList {
    type Item: Clone + 'static;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`, or `None` if out of range.
    fn get(&self, index: usize) -> Option<Self::Item>;

    /// Snapshot of the current contents in order.
    fn to_vec(&self) -> Vec<Self::Item> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }

    /// Register a shared change callback.
    fn subscribe_with(&self, callback: Rc<ChangeCallback<Self::Item>>) -> Subscription;

    /// Register a change callback.
    fn subscribe(&self, callback: impl Fn(&ListChange<Self::Item>) + 'static) -> Subscription
    where
        Self: Sized,
    {
        self.subscribe_with(Rc::new(callback))
    }

    /// Live view of the elements accepted by `filter`.
    fn filtered(&self, filter: Filter<Self::Item>) -> FilteredView<Self::Item>
    where
        Self: Clone + Sized + 'static,
    {
        FilteredView::new(self, filter)
    }

    /// Live view of the elements for which `predicate` holds.
    fn filter_by(&self, predicate: impl Fn(&Self::Item) -> bool + 'static) -> FilteredView<Self::Item>
    where
        Self: Clone + Sized + 'static,
    {
        FilteredView::new(self, Filter::predicate(predicate))
    }

    /// Live element-wise conversion of this list.
    fn converted<D: Clone + 'static>(
        &self,
        converter: impl Fn(&Self::Item) -> D + 'static,
    ) -> ConvertedView<Self::Item, D>
    where
        Self: Clone + Sized + 'static,
    {
        ConvertedView::new(self, converter)
    }

    /// Live reversed view of this list.
    fn reversed(&self) -> ReverseView<Self>
    where
        Self: Clone + Sized + 'static,
    {
        ReverseView::new(self)
    }

    /// Live window `start..start + length` of this list.
    fn range(&self, start: usize, length: usize) -> RangeView<Self>
    where
        Self: Clone + Sized + 'static,
    {
        RangeView::new(self, start, length)
    }
}

/// A writable observable sequence.
///
/// Out-of-range arguments fail with no mutation and no notification.
pub trait ListMut: ObservableList {
    /// Replace the element at `index`, returning the previous value.
    fn set(&self, index: usize, value: Self::Item) -> Result<Self::Item>;

    /// Insert `items` so the first lands at `index` (`0..=len`).
    fn insert_range(&self, index: usize, items: Vec<Self::Item>) -> Result<()>;

    /// Remove `count` elements starting at `index`.
    fn remove_range(&self, index: usize, count: usize) -> Result<Vec<Self::Item>>;

    /// Move the run `old_index..old_index + count` so its first element ends
    /// up at `new_index`.
    fn move_range(&self, old_index: usize, new_index: usize, count: usize) -> Result<()>;

    fn insert(&self, index: usize, item: Self::Item) -> Result<()> {
        self.insert_range(index, vec![item])
    }

    fn push(&self, item: Self::Item) -> Result<()> {
        self.insert(self.len(), item)
    }

    fn remove_at(&self, index: usize) -> Result<Self::Item> {
        let len = self.len();
        self.remove_range(index, 1)?
            .pop()
            .ok_or(CollectionError::IndexOutOfBounds { index, len })
    }

    fn move_item(&self, old_index: usize, new_index: usize) -> Result<()> {
        self.move_range(old_index, new_index, 1)
    }
}
