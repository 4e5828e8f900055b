#![forbid(unsafe_code)]

//! Sorted container that reports its mutations.
//!
//! [`SortedObservableVec<T>`] runs the same algorithms as
//! [`SortedVec`](crate::sorted::SortedVec) and additionally delivers a
//! [`ListChange`] for every structural change:
//!
//! - `add`: one `Add` at the upper-bound position.
//! - `add_all`: one `Add` per contiguous run of the merge result.
//! - `remove` / `remove_all`: one `Remove` per contiguous removed run,
//!   last run first.
//! - `sort_at` / `sort_item`: one `Move`, only if the element relocated.
//! - `update`: one `Replace`, then a `Move` if the new key relocated it.
//! - `clear`: one `Reset`.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::change::{ChangeCallback, ListChange, ObservableList, Subscribers, Subscription};
use crate::error::{CollectionError, Result};
use crate::sorted::{Comparer, SortedVec};

struct SortedInner<T> {
    sorted: RefCell<SortedVec<T>>,
    subscribers: Subscribers<T>,
}

/// A shared, change-notifying sorted multiset.
///
/// Cloning creates a new handle to the **same** contents.
pub struct SortedObservableVec<T> {
    inner: Rc<SortedInner<T>>,
}

impl<T> Clone for SortedObservableVec<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SortedObservableVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedObservableVec")
            .field("items", &self.inner.sorted.borrow().as_slice())
            .field("subscribers", &self.inner.subscribers)
            .finish()
    }
}

impl<T: Ord + Clone + 'static> Default for SortedObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone + 'static> SortedObservableVec<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::from_sorted(SortedVec::new())
    }
}

impl<T: Clone + 'static> SortedObservableVec<T> {
    #[must_use]
    pub fn with_comparer(comparer: impl Fn(&T, &T) -> Ordering + 'static) -> Self {
        Self::from_sorted(SortedVec::with_comparer(comparer))
    }

    #[must_use]
    pub fn by_key<K: Ord>(key: impl Fn(&T) -> K + 'static) -> Self {
        Self::from_sorted(SortedVec::by_key(key))
    }

    /// Wrap an existing sorted container, keeping its contents.
    #[must_use]
    pub fn from_sorted(sorted: SortedVec<T>) -> Self {
        Self {
            inner: Rc::new(SortedInner {
                sorted: RefCell::new(sorted),
                subscribers: Subscribers::new(),
            }),
        }
    }

    #[must_use]
    pub fn comparer(&self) -> Comparer<T> {
        Rc::clone(self.inner.sorted.borrow().comparer())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.sorted.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.sorted.borrow().get(index).cloned()
    }

    #[must_use]
    pub fn first(&self) -> Option<T> {
        self.inner.sorted.borrow().first().cloned()
    }

    #[must_use]
    pub fn last(&self) -> Option<T> {
        self.inner.sorted.borrow().last().cloned()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.sorted.borrow().as_slice().to_vec()
    }

    /// Borrow the contents without cloning.
    ///
    /// # Panics
    ///
    /// Panics if `f` mutates this container.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(self.inner.sorted.borrow().as_slice())
    }

    /// Insert `item` after any equal elements; returns where it landed.
    pub fn add(&self, item: T) -> usize {
        self.inner.subscribers.debug_assert_idle();
        let index = self.inner.sorted.borrow_mut().add(item.clone());
        self.inner.subscribers.notify(&ListChange::Add {
            index,
            items: vec![item],
        });
        index
    }

    /// Merge `items` in one pass, sending one `Add` per contiguous run.
    pub fn add_all(&self, items: impl IntoIterator<Item = T>, presorted: bool) -> usize {
        self.inner.subscribers.debug_assert_idle();
        let changes: Vec<ListChange<T>> = {
            let mut sorted = self.inner.sorted.borrow_mut();
            let runs = sorted.add_all(items, presorted);
            let slice = sorted.as_slice();
            runs.into_iter()
                .map(|run| ListChange::Add {
                    index: run.start,
                    items: slice[run].to_vec(),
                })
                .collect()
        };
        let added = changes.iter().map(|c| c.new_items().len()).sum();
        #[cfg(feature = "tracing")]
        tracing::trace!(
            message = "collections.sorted.add_all",
            added,
            runs = changes.len(),
            presorted
        );
        self.inner.subscribers.notify_all(&changes);
        added
    }

    pub fn clear(&self) {
        self.inner.subscribers.debug_assert_idle();
        self.inner.sorted.borrow_mut().clear();
        self.inner.subscribers.notify(&ListChange::Reset);
    }

    /// Restore order after the element at `index` had its key changed in
    /// place. Sends a `Move` and returns `true` only if it relocated.
    pub fn sort_at(&self, index: usize) -> Result<bool> {
        self.inner.subscribers.debug_assert_idle();
        let (new_index, item) = {
            let mut sorted = self.inner.sorted.borrow_mut();
            let new_index = sorted.relocate(index)?;
            (new_index, sorted.get(new_index).cloned())
        };
        Ok(self.notify_relocated(index, new_index, item))
    }

    /// Mutate the element at `index` through `f` and re-sort it.
    ///
    /// Sends a `Replace` at `index`, then a `Move` if the element relocated.
    /// Returns the new index.
    pub fn update(&self, index: usize, f: impl FnOnce(&mut T)) -> Result<usize> {
        self.inner.subscribers.debug_assert_idle();
        let (old, new_index, new) = {
            let mut sorted = self.inner.sorted.borrow_mut();
            let old = sorted
                .get(index)
                .cloned()
                .ok_or(CollectionError::IndexOutOfBounds {
                    index,
                    len: sorted.len(),
                })?;
            let new_index = sorted.update(index, f)?;
            (old, new_index, sorted.get(new_index).cloned())
        };
        let Some(new) = new else {
            return Ok(new_index);
        };
        self.inner.subscribers.notify(&ListChange::Replace {
            index,
            old_items: vec![old],
            new_items: vec![new.clone()],
        });
        self.notify_relocated(index, new_index, Some(new));
        Ok(new_index)
    }

    fn notify_relocated(&self, old_index: usize, new_index: usize, item: Option<T>) -> bool {
        if old_index == new_index {
            return false;
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(
            message = "collections.sorted.relocate",
            from = old_index,
            to = new_index
        );
        if let Some(item) = item {
            self.inner.subscribers.notify(&ListChange::Move {
                old_index,
                new_index,
                items: vec![item],
            });
        }
        true
    }
}

impl<T: Clone + PartialEq + 'static> SortedObservableVec<T> {
    #[must_use]
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.inner.sorted.borrow().index_of(item)
    }

    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.index_of(item).is_some()
    }

    /// Remove one instance equal to `item`. Returns `false` if none exists.
    pub fn remove(&self, item: &T) -> bool {
        self.inner.subscribers.debug_assert_idle();
        let taken = self.inner.sorted.borrow_mut().take(item);
        match taken {
            Some((index, removed)) => {
                self.inner.subscribers.notify(&ListChange::Remove {
                    index,
                    items: vec![removed],
                });
                true
            }
            None => false,
        }
    }

    /// Remove one instance per element of `items` (multiset difference).
    ///
    /// Sends one `Remove` per contiguous run of removed elements, last run
    /// first at pre-removal indices. Returns how many elements were removed.
    pub fn remove_all(&self, items: impl IntoIterator<Item = T>) -> usize {
        self.inner.subscribers.debug_assert_idle();
        let runs = self.inner.sorted.borrow_mut().take_all(items);
        let changes: Vec<ListChange<T>> = runs
            .into_iter()
            .map(|(index, items)| ListChange::Remove { index, items })
            .collect();
        let removed = changes.iter().map(|c| c.old_items().len()).sum();
        self.inner.subscribers.notify_all(&changes);
        removed
    }

    /// Re-sort the element equal to `item` after its key changed in place.
    pub fn sort_item(&self, item: &T) -> Result<bool> {
        let index = self
            .inner
            .sorted
            .borrow()
            .position_exact(item)
            .ok_or(CollectionError::ItemNotFound)?;
        self.sort_at(index)
    }
}

impl<T: Clone + 'static> ObservableList for SortedObservableVec<T> {
    type Item = T;

    fn len(&self) -> usize {
        SortedObservableVec::len(self)
    }

    fn get(&self, index: usize) -> Option<T> {
        SortedObservableVec::get(self, index)
    }

    fn to_vec(&self) -> Vec<T> {
        SortedObservableVec::to_vec(self)
    }

    fn subscribe_with(&self, callback: Rc<ChangeCallback<T>>) -> Subscription {
        self.inner.subscribers.subscribe(callback)
    }
}
