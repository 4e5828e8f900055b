#![forbid(unsafe_code)]

//! Ascending multiset container.
//!
//! [`SortedVec<T>`] keeps its elements ordered by a [`Comparer`] fixed at
//! construction. Duplicates are allowed and kept as distinct instances.
//!
//! # Invariants
//!
//! 1. For every adjacent pair `(a, b)`, `comparer(a, b) != Greater`, except
//!    transiently after an element's key was changed behind the container's
//!    back and before [`SortedVec::sort_at`] is called for it.
//! 2. Insertion is stable: a new element lands after every existing element
//!    that compares equal to it.
//! 3. Removal is by exact equality within the equal-key run: it removes one
//!    instance and never an element that is merely key-equal.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

use crate::error::{CollectionError, Result};
use crate::search::{lower_bound_by, upper_bound_by};

/// Total order used by sorted containers.
pub type Comparer<T> = Rc<dyn Fn(&T, &T) -> Ordering>;

/// A vector kept in ascending order.
pub struct SortedVec<T> {
    items: Vec<T>,
    comparer: Comparer<T>,
}

impl<T: Clone> Clone for SortedVec<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            comparer: Rc::clone(&self.comparer),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SortedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SortedVec").field(&self.items).finish()
    }
}

impl<T: Ord + 'static> Default for SortedVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + 'static> SortedVec<T> {
    /// Empty container ordered by `T`'s natural order.
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparer(T::cmp)
    }
}

impl<T> SortedVec<T> {
    #[must_use]
    pub fn with_comparer(comparer: impl Fn(&T, &T) -> Ordering + 'static) -> Self {
        Self::from_comparer(Rc::new(comparer))
    }

    #[must_use]
    pub fn from_comparer(comparer: Comparer<T>) -> Self {
        Self {
            items: Vec::new(),
            comparer,
        }
    }

    /// Empty container ordered by a projected key.
    #[must_use]
    pub fn by_key<K: Ord>(key: impl Fn(&T) -> K + 'static) -> Self {
        Self::with_comparer(move |a, b| key(a).cmp(&key(b)))
    }

    #[must_use]
    pub fn comparer(&self) -> &Comparer<T> {
        &self.comparer
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Insert `item` after any equal elements; returns where it landed.
    pub fn add(&mut self, item: T) -> usize {
        let cmp = &*self.comparer;
        let index = upper_bound_by(&self.items, |existing| cmp(existing, &item));
        self.items.insert(index, item);
        index
    }

    /// Merge `items` into the container in one linear pass.
    ///
    /// With `presorted` the input must already be ascending under the
    /// container's comparer; otherwise a working copy is sorted first.
    /// Returns the index ranges, in the final layout and ascending order,
    /// that the new elements occupy.
    pub fn add_all(&mut self, items: impl IntoIterator<Item = T>, presorted: bool) -> Vec<Range<usize>> {
        let mut incoming: Vec<T> = items.into_iter().collect();
        if incoming.is_empty() {
            return Vec::new();
        }
        let cmp = &*self.comparer;
        if !presorted {
            incoming.sort_by(|a, b| cmp(a, b));
        }

        let existing = std::mem::take(&mut self.items);
        let mut merged = Vec::with_capacity(existing.len() + incoming.len());
        let mut runs: Vec<Range<usize>> = Vec::new();
        let mut existing = existing.into_iter().peekable();
        for item in incoming {
            while let Some(e) = existing.next_if(|e| cmp(e, &item) != Ordering::Greater) {
                merged.push(e);
            }
            let at = merged.len();
            match runs.last_mut() {
                Some(run) if run.end == at => run.end += 1,
                _ => runs.push(at..at + 1),
            }
            merged.push(item);
        }
        merged.extend(existing);
        self.items = merged;
        runs
    }

    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        CollectionError::check_index(index, self.items.len())?;
        Ok(self.items.remove(index))
    }

    /// Restore order after the element at `index` had its key changed in
    /// place. Returns whether it moved.
    pub fn sort_at(&mut self, index: usize) -> Result<bool> {
        Ok(self.relocate(index)? != index)
    }

    /// Mutate the element at `index` through `f`, then move it to its
    /// ordered position. Returns the new index.
    pub fn update(&mut self, index: usize, f: impl FnOnce(&mut T)) -> Result<usize> {
        CollectionError::check_index(index, self.items.len())?;
        f(&mut self.items[index]);
        self.relocate(index)
    }

    /// Move the element at `index` to its ordered position, searching only
    /// the side it is out of order with. Returns the new index.
    pub(crate) fn relocate(&mut self, index: usize) -> Result<usize> {
        let len = self.items.len();
        CollectionError::check_index(index, len)?;
        let cmp = &*self.comparer;
        let item = &self.items[index];

        if index > 0 && cmp(&self.items[index - 1], item) == Ordering::Greater {
            let target = upper_bound_by(&self.items[..index], |existing| cmp(existing, item));
            self.items[target..=index].rotate_right(1);
            return Ok(target);
        }
        if index + 1 < len && cmp(&self.items[index + 1], item) == Ordering::Less {
            let offset = upper_bound_by(&self.items[index + 1..], |existing| cmp(existing, item));
            let target = index + offset;
            self.items[index..=target].rotate_left(1);
            return Ok(target);
        }
        Ok(index)
    }
}

impl<T: PartialEq> SortedVec<T> {
    /// Index of an element equal to `item`, found via its equal-key run.
    #[must_use]
    pub fn index_of(&self, item: &T) -> Option<usize> {
        let cmp = &*self.comparer;
        let start = lower_bound_by(&self.items, |existing| cmp(existing, item));
        self.items[start..]
            .iter()
            .take_while(|existing| cmp(existing, item) == Ordering::Equal)
            .position(|existing| existing == item)
            .map(|offset| start + offset)
    }

    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.index_of(item).is_some()
    }

    /// Remove one instance equal to `item`. Returns `false` if none exists.
    pub fn remove(&mut self, item: &T) -> bool {
        self.take(item).is_some()
    }

    /// Remove one instance per element of `items` (multiset difference).
    /// Returns how many were removed; absent values are skipped.
    pub fn remove_all(&mut self, items: impl IntoIterator<Item = T>) -> usize {
        self.take_all(items).iter().map(|(_, run)| run.len()).sum()
    }

    /// Re-sort the element equal to `item` after its key changed in place.
    ///
    /// The element is located by a linear scan, since its key no longer
    /// matches its position.
    pub fn sort_item(&mut self, item: &T) -> Result<bool> {
        let index = self
            .position_exact(item)
            .ok_or(CollectionError::ItemNotFound)?;
        self.sort_at(index)
    }

    pub(crate) fn take(&mut self, item: &T) -> Option<(usize, T)> {
        let index = self.index_of(item)?;
        Some((index, self.items.remove(index)))
    }

    /// Mark one exact match per element of `items`, then sweep them out in a
    /// single pass.
    ///
    /// Returns the removed runs last first, each at its pre-removal index.
    pub(crate) fn take_all(&mut self, items: impl IntoIterator<Item = T>) -> Vec<(usize, Vec<T>)> {
        let cmp = &*self.comparer;
        let mut marked = vec![false; self.items.len()];
        let mut any = false;
        for item in items {
            let start = lower_bound_by(&self.items, |existing| cmp(existing, &item));
            let hit = self.items[start..]
                .iter()
                .enumerate()
                .take_while(|(_, existing)| cmp(existing, &item) == Ordering::Equal)
                .find(|&(offset, existing)| !marked[start + offset] && *existing == item)
                .map(|(offset, _)| start + offset);
            if let Some(index) = hit {
                marked[index] = true;
                any = true;
            }
        }
        if !any {
            return Vec::new();
        }

        let old = std::mem::take(&mut self.items);
        let mut kept = Vec::with_capacity(old.len());
        let mut runs = Vec::new();
        let mut run: Vec<T> = Vec::new();
        let mut run_start = 0;
        for (index, (item, remove)) in old.into_iter().zip(marked).enumerate() {
            if remove {
                if run.is_empty() {
                    run_start = index;
                }
                run.push(item);
            } else {
                if !run.is_empty() {
                    runs.push((run_start, std::mem::take(&mut run)));
                }
                kept.push(item);
            }
        }
        if !run.is_empty() {
            runs.push((run_start, run));
        }
        self.items = kept;
        runs.reverse();
        runs
    }

    pub(crate) fn position_exact(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|existing| existing == item)
    }
}

impl<'a, T> IntoIterator for &'a SortedVec<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn is_ascending<T>(list: &SortedVec<T>) -> bool {
        let cmp = list.comparer();
        list.as_slice()
            .windows(2)
            .all(|w| cmp(&w[0], &w[1]) != Ordering::Greater)
    }

    #[test]
    fn add_all_unsorted_batch() {
        let mut list = SortedVec::new();
        list.add_all([5, 3, 3, 1], false);
        assert_eq!(list.as_slice(), &[1, 3, 3, 5]);
    }

    #[test]
    fn add_all_reports_insertion_runs() {
        let mut list = SortedVec::new();
        list.add_all([10, 20, 30], true);
        let runs = list.add_all([5, 6, 25, 40, 41], true);
        assert_eq!(list.as_slice(), &[5, 6, 10, 20, 25, 30, 40, 41]);
        assert_eq!(runs, vec![0..2, 4..5, 6..8]);
    }

    #[test]
    fn add_is_stable_among_equal_keys() {
        let mut list = SortedVec::by_key(|p: &(i32, char)| p.0);
        list.add((1, 'a'));
        list.add((2, 'b'));
        assert_eq!(list.add((1, 'c')), 1);
        list.add_all([(1, 'd'), (0, 'e')], false);
        let tags: String = list.iter().map(|p| p.1).collect();
        assert_eq!(tags, "eacdb");
    }

    #[test]
    fn remove_matches_exact_value_within_run() {
        let mut list = SortedVec::by_key(|p: &(i32, char)| p.0);
        list.add_all([(1, 'a'), (1, 'b'), (1, 'c'), (2, 'd')], true);
        assert!(list.remove(&(1, 'b')));
        assert!(!list.remove(&(1, 'z')));
        assert!(!list.remove(&(9, 'a')));
        let tags: String = list.iter().map(|p| p.1).collect();
        assert_eq!(tags, "acd");
    }

    #[test]
    fn remove_all_is_multiset_difference() {
        let mut list = SortedVec::new();
        list.add_all([1, 2, 2, 2, 3], false);
        assert_eq!(list.remove_all([2, 2, 4]), 2);
        assert_eq!(list.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn sort_at_moves_only_when_out_of_order() {
        let cells: Vec<Rc<RefCell<i32>>> = (0..5).map(|v| Rc::new(RefCell::new(v * 10))).collect();
        let mut list = SortedVec::by_key(|c: &Rc<RefCell<i32>>| *c.borrow());
        list.add_all(cells.iter().cloned(), true);

        *cells[1].borrow_mut() = 15;
        assert_eq!(list.sort_at(1), Ok(false));

        *cells[1].borrow_mut() = 35;
        assert_eq!(list.sort_at(1), Ok(true));
        assert!(is_ascending(&list));
        assert_eq!(list.position_exact(&cells[1]), Some(3));

        *cells[4].borrow_mut() = -1;
        assert_eq!(list.sort_item(&cells[4]), Ok(true));
        assert_eq!(*list.first().expect("non-empty").borrow(), -1);
        assert!(is_ascending(&list));
    }

    #[test]
    fn update_relocates_owned_values() {
        let mut list = SortedVec::new();
        list.add_all([1, 4, 7, 9], true);
        assert_eq!(list.update(0, |v| *v = 8), Ok(2));
        assert_eq!(list.as_slice(), &[4, 7, 8, 9]);
        assert_eq!(list.update(3, |v| *v = 0), Ok(0));
        assert_eq!(list.as_slice(), &[0, 4, 7, 8]);
        assert!(list.update(4, |_| {}).is_err());
    }

    #[test]
    fn sort_item_missing_value() {
        let mut list = SortedVec::new();
        list.add(1);
        assert_eq!(list.sort_item(&2), Err(CollectionError::ItemNotFound));
    }

    #[test]
    fn index_of_and_contains() {
        let mut list = SortedVec::new();
        list.add_all([3, 1, 2, 2], false);
        assert_eq!(list.index_of(&2), Some(1));
        assert!(list.contains(&3));
        assert!(!list.contains(&4));
        assert_eq!(list.last(), Some(&3));
    }
}
