#![forbid(unsafe_code)]

//! The primary mutable observable list.
//!
//! [`ObservableVec<T>`] is a shared, growable sequence that reports every
//! mutation as the smallest sequence of [`ListChange`]s that replays it:
//!
//! | Operation | Notification |
//! |---|---|
//! | `push`, `extend`, `insert`, `insert_range` | one `Add` |
//! | `set` | one `Replace` |
//! | `move_item`, `move_range` | one `Move` (none if the index is unchanged) |
//! | `remove_at`, `remove_range` | one `Remove` |
//! | `remove_all` | one `Remove` per contiguous removed run, last run first |
//! | `clear` | one `Reset` |
//!
//! Empty batches are no-ops and notify nobody.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::change::{ChangeCallback, ListChange, ListMut, ObservableList, Subscribers, Subscription};
use crate::error::{CollectionError, Result};

struct ObservableVecInner<T> {
    items: RefCell<Vec<T>>,
    subscribers: Subscribers<T>,
}

/// A shared, change-notifying vector.
///
/// Cloning creates a new handle to the **same** contents.
pub struct ObservableVec<T> {
    inner: Rc<ObservableVecInner<T>>,
}

impl<T> Clone for ObservableVec<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableVec")
            .field("items", &self.inner.items.borrow())
            .field("subscribers", &self.inner.subscribers)
            .finish()
    }
}

impl<T: Clone + 'static> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> From<Vec<T>> for ObservableVec<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: Clone + 'static> FromIterator<T> for ObservableVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: Clone + 'static> ObservableVec<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            inner: Rc::new(ObservableVecInner {
                items: RefCell::new(items),
                subscribers: Subscribers::new(),
            }),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.items.borrow().get(index).cloned()
    }

    /// Borrow the contents without cloning.
    ///
    /// # Panics
    ///
    /// Panics if `f` mutates this list.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.items.borrow())
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.items.borrow().clone()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Append one element.
    pub fn push(&self, item: T) {
        let index = self.len();
        self.insert_vec(index, vec![item]);
    }

    /// Append every element of `items` as a single `Add`.
    pub fn extend(&self, items: impl IntoIterator<Item = T>) {
        let index = self.len();
        self.insert_vec(index, items.into_iter().collect());
    }

    pub fn insert(&self, index: usize, item: T) -> Result<()> {
        self.insert_range(index, [item])
    }

    /// Insert `items` so the first lands at `index`.
    pub fn insert_range(&self, index: usize, items: impl IntoIterator<Item = T>) -> Result<()> {
        CollectionError::check_insert(index, self.len())?;
        self.insert_vec(index, items.into_iter().collect());
        Ok(())
    }

    fn insert_vec(&self, index: usize, items: Vec<T>) {
        self.inner.subscribers.debug_assert_idle();
        if items.is_empty() {
            return;
        }
        self.inner
            .items
            .borrow_mut()
            .splice(index..index, items.iter().cloned());
        self.inner
            .subscribers
            .notify(&ListChange::Add { index, items });
    }

    /// Replace the element at `index`, returning the previous value.
    pub fn set(&self, index: usize, value: T) -> Result<T> {
        self.inner.subscribers.debug_assert_idle();
        let old = {
            let mut items = self.inner.items.borrow_mut();
            CollectionError::check_index(index, items.len())?;
            std::mem::replace(&mut items[index], value.clone())
        };
        self.inner.subscribers.notify(&ListChange::Replace {
            index,
            old_items: vec![old.clone()],
            new_items: vec![value],
        });
        Ok(old)
    }

    pub fn move_item(&self, old_index: usize, new_index: usize) -> Result<()> {
        self.move_range(old_index, new_index, 1)
    }

    /// Move the run `old_index..old_index + count` so that its first element
    /// ends up at `new_index`.
    pub fn move_range(&self, old_index: usize, new_index: usize, count: usize) -> Result<()> {
        self.inner.subscribers.debug_assert_idle();
        let moved = {
            let mut items = self.inner.items.borrow_mut();
            let len = items.len();
            CollectionError::check_range(old_index, count, len)?;
            CollectionError::check_range(new_index, count, len)?;
            if count == 0 || old_index == new_index {
                return Ok(());
            }
            if old_index < new_index {
                items[old_index..new_index + count].rotate_left(count);
            } else {
                items[new_index..old_index + count].rotate_right(count);
            }
            items[new_index..new_index + count].to_vec()
        };
        self.inner.subscribers.notify(&ListChange::Move {
            old_index,
            new_index,
            items: moved,
        });
        Ok(())
    }

    pub fn remove_at(&self, index: usize) -> Result<T> {
        CollectionError::check_index(index, self.len())?;
        let mut removed = self.remove_range(index, 1)?;
        removed.pop().ok_or(CollectionError::ItemNotFound)
    }

    /// Remove `count` elements starting at `index`.
    pub fn remove_range(&self, index: usize, count: usize) -> Result<Vec<T>> {
        self.inner.subscribers.debug_assert_idle();
        let removed: Vec<T> = {
            let mut items = self.inner.items.borrow_mut();
            CollectionError::check_range(index, count, items.len())?;
            items.drain(index..index + count).collect()
        };
        if !removed.is_empty() {
            self.inner.subscribers.notify(&ListChange::Remove {
                index,
                items: removed.clone(),
            });
        }
        Ok(removed)
    }

    /// Remove every element matching `predicate`, returning how many went.
    ///
    /// The predicate sees each element once, in order. One `Remove` is sent
    /// per contiguous run of removed elements, last run first, each at its
    /// pre-removal index; replaying them in order reproduces the new state.
    pub fn remove_all(&self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        self.inner.subscribers.debug_assert_idle();
        let mut changes = Vec::new();
        let mut removed = 0;
        {
            let mut items = self.inner.items.borrow_mut();
            let old = std::mem::take(&mut *items);
            let mut kept = Vec::with_capacity(old.len());
            let mut run: Vec<T> = Vec::new();
            let mut run_start = 0;
            for (index, item) in old.into_iter().enumerate() {
                if predicate(&item) {
                    if run.is_empty() {
                        run_start = index;
                    }
                    run.push(item);
                } else {
                    if !run.is_empty() {
                        removed += run.len();
                        changes.push(ListChange::Remove {
                            index: run_start,
                            items: std::mem::take(&mut run),
                        });
                    }
                    kept.push(item);
                }
            }
            if !run.is_empty() {
                removed += run.len();
                changes.push(ListChange::Remove {
                    index: run_start,
                    items: run,
                });
            }
            *items = kept;
        }
        changes.reverse();
        #[cfg(feature = "tracing")]
        tracing::trace!(
            message = "collections.remove_all",
            removed,
            runs = changes.len()
        );
        self.inner.subscribers.notify_all(&changes);
        removed
    }

    /// Remove everything, sending a single `Reset`.
    pub fn clear(&self) {
        self.inner.subscribers.debug_assert_idle();
        self.inner.items.borrow_mut().clear();
        self.inner.subscribers.notify(&ListChange::Reset);
    }
}

impl<T: Clone + 'static> ObservableList for ObservableVec<T> {
    type Item = T;

    fn len(&self) -> usize {
        ObservableVec::len(self)
    }

    fn get(&self, index: usize) -> Option<T> {
        ObservableVec::get(self, index)
    }

    fn to_vec(&self) -> Vec<T> {
        ObservableVec::to_vec(self)
    }

    fn subscribe_with(&self, callback: Rc<ChangeCallback<T>>) -> Subscription {
        self.inner.subscribers.subscribe(callback)
    }
}

impl<T: Clone + 'static> ListMut for ObservableVec<T> {
    fn set(&self, index: usize, value: T) -> Result<T> {
        ObservableVec::set(self, index, value)
    }

    fn insert_range(&self, index: usize, items: Vec<T>) -> Result<()> {
        ObservableVec::insert_range(self, index, items)
    }

    fn remove_range(&self, index: usize, count: usize) -> Result<Vec<T>> {
        ObservableVec::remove_range(self, index, count)
    }

    fn move_range(&self, old_index: usize, new_index: usize, count: usize) -> Result<()> {
        ObservableVec::move_range(self, old_index, new_index, count)
    }
}
