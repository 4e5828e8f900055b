#![forbid(unsafe_code)]

//! Live filtered view over an observable list.
//!
//! A [`FilteredView<T>`] is bound to one source for its whole lifetime and
//! keeps `view == source.filter(accepts)` after every source change. It does
//! not re-scan the source per change: it keeps one inclusion flag per source
//! position and translates each source change into view changes from those
//! flags alone.
//!
//! # Translation
//!
//! | Source change | View change |
//! |---|---|
//! | `Add` | one `Add` with the accepted subset, at the count of accepted elements before the insertion point |
//! | `Remove` | one `Remove` with the previously included subset |
//! | `Replace` | per element: `Replace` (kept), `Remove` (dropped), `Add` (newly accepted), or nothing |
//! | `Move` | one `Move` if included elements moved and their view position changed |
//! | `Reset` | re-filter the source, then `Reset` |
//!
//! Accepted elements of one contiguous source run are always contiguous in
//! the view, so a single `Add`/`Remove` covers them.
//!
//! # Failure Modes
//!
//! - **Predicate panics**: propagates to the mutator's caller; the view's
//!   state is unspecified afterwards.
//! - **Source change that does not fit the view's bookkeeping** (a source
//!   that breaks the notification contract): the view re-reads the source and
//!   sends `Reset`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::change::{ChangeCallback, ListChange, ObservableList, Subscribers, Subscription};

/// Inclusion rule for a [`FilteredView`].
pub enum Filter<T> {
    /// Accept everything; the view mirrors its source one to one.
    All,
    /// Accept elements for which the predicate holds.
    Predicate(Rc<dyn Fn(&T) -> bool>),
}

impl<T> Filter<T> {
    pub fn predicate(predicate: impl Fn(&T) -> bool + 'static) -> Self {
        Self::Predicate(Rc::new(predicate))
    }

    #[must_use]
    pub fn accepts(&self, item: &T) -> bool {
        match self {
            Self::All => true,
            Self::Predicate(predicate) => predicate(item),
        }
    }

    #[must_use]
    pub const fn is_identity(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl<T> Clone for Filter<T> {
    fn clone(&self) -> Self {
        match self {
            Self::All => Self::All,
            Self::Predicate(predicate) => Self::Predicate(Rc::clone(predicate)),
        }
    }
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("Filter::All"),
            Self::Predicate(_) => f.write_str("Filter::Predicate(..)"),
        }
    }
}

/// Bookkeeping: one flag per source position, plus the accepted elements.
struct FilterState<T> {
    included: Vec<bool>,
    items: Vec<T>,
}

impl<T: Clone> FilterState<T> {
    fn build(filter: &Filter<T>, source: Vec<T>) -> Self {
        let included: Vec<bool> = source.iter().map(|item| filter.accepts(item)).collect();
        let items = source
            .into_iter()
            .zip(&included)
            .filter_map(|(item, &keep)| keep.then_some(item))
            .collect();
        Self { included, items }
    }

    fn accepted_before(&self, source_index: usize) -> usize {
        self.included[..source_index].iter().filter(|&&f| f).count()
    }

    fn on_add(&mut self, filter: &Filter<T>, index: usize, added: &[T]) -> Vec<ListChange<T>> {
        let at = self.accepted_before(index);
        let flags: Vec<bool> = added.iter().map(|item| filter.accepts(item)).collect();
        let accepted: Vec<T> = added
            .iter()
            .zip(&flags)
            .filter_map(|(item, &keep)| keep.then(|| item.clone()))
            .collect();
        self.included.splice(index..index, flags);
        if accepted.is_empty() {
            return Vec::new();
        }
        self.items.splice(at..at, accepted.iter().cloned());
        vec![ListChange::Add {
            index: at,
            items: accepted,
        }]
    }

    fn on_remove(&mut self, index: usize, count: usize) -> Vec<ListChange<T>> {
        let at = self.accepted_before(index);
        let dropped = self
            .included
            .drain(index..index + count)
            .filter(|&f| f)
            .count();
        if dropped == 0 {
            return Vec::new();
        }
        vec![ListChange::Remove {
            index: at,
            items: self.items.drain(at..at + dropped).collect(),
        }]
    }

    fn on_replace(
        &mut self,
        filter: &Filter<T>,
        index: usize,
        new_items: &[T],
    ) -> Vec<ListChange<T>> {
        let mut at = self.accepted_before(index);
        let mut changes = Vec::new();
        for (offset, new) in new_items.iter().enumerate() {
            let was = self.included[index + offset];
            let now = filter.accepts(new);
            self.flip(&mut changes, at, was, now, new);
            self.included[index + offset] = now;
            if now {
                at += 1;
            }
        }
        changes
    }

    fn on_move(&mut self, old_index: usize, new_index: usize, count: usize) -> Vec<ListChange<T>> {
        let old_at = self.accepted_before(old_index);
        let flags: Vec<bool> = self.included.drain(old_index..old_index + count).collect();
        let moving = flags.iter().filter(|&&f| f).count();
        let moved: Vec<T> = self.items.drain(old_at..old_at + moving).collect();
        let new_at = self.accepted_before(new_index);
        self.included.splice(new_index..new_index, flags);
        self.items.splice(new_at..new_at, moved.iter().cloned());
        if moving == 0 || old_at == new_at {
            return Vec::new();
        }
        vec![ListChange::Move {
            old_index: old_at,
            new_index: new_at,
            items: moved,
        }]
    }

    /// Re-evaluate every flag against a same-length snapshot of the source.
    fn refresh(&mut self, filter: &Filter<T>, source: &[T]) -> Vec<ListChange<T>> {
        let mut at = 0;
        let mut changes = Vec::new();
        for (index, item) in source.iter().enumerate() {
            let was = self.included[index];
            let now = filter.accepts(item);
            if was != now {
                self.flip(&mut changes, at, was, now, item);
                self.included[index] = now;
            }
            if now {
                at += 1;
            }
        }
        changes
    }

    /// Apply one element's inclusion transition at view position `at`,
    /// extending the previous change when it is adjacent and of the same kind.
    fn flip(&mut self, changes: &mut Vec<ListChange<T>>, at: usize, was: bool, now: bool, item: &T) {
        match (was, now) {
            (true, true) => {
                let old = std::mem::replace(&mut self.items[at], item.clone());
                match changes.last_mut() {
                    Some(ListChange::Replace {
                        index,
                        old_items,
                        new_items,
                    }) if *index + new_items.len() == at => {
                        old_items.push(old);
                        new_items.push(item.clone());
                    }
                    _ => changes.push(ListChange::Replace {
                        index: at,
                        old_items: vec![old],
                        new_items: vec![item.clone()],
                    }),
                }
            }
            (true, false) => {
                let old = self.items.remove(at);
                match changes.last_mut() {
                    Some(ListChange::Remove { index, items }) if *index == at => items.push(old),
                    _ => changes.push(ListChange::Remove {
                        index: at,
                        items: vec![old],
                    }),
                }
            }
            (false, true) => {
                self.items.insert(at, item.clone());
                match changes.last_mut() {
                    Some(ListChange::Add { index, items }) if *index + items.len() == at => {
                        items.push(item.clone());
                    }
                    _ => changes.push(ListChange::Add {
                        index: at,
                        items: vec![item.clone()],
                    }),
                }
            }
            (false, false) => {}
        }
    }
}

struct FilteredInner<T: Clone + 'static> {
    filter: Filter<T>,
    source: Box<dyn ObservableList<Item = T>>,
    state: RefCell<FilterState<T>>,
    subscribers: Subscribers<T>,
    source_subscription: RefCell<Option<Subscription>>,
}

impl<T: Clone + 'static> FilteredInner<T> {
    fn on_source_change(&self, change: &ListChange<T>) {
        let changes = {
            let mut state = self.state.borrow_mut();
            if change.check_fits(state.included.len()).is_err() {
                self.resync(&mut state)
            } else {
                match change {
                    ListChange::Add { index, items } => state.on_add(&self.filter, *index, items),
                    ListChange::Remove { index, items } => state.on_remove(*index, items.len()),
                    ListChange::Replace {
                        index, new_items, ..
                    } => state.on_replace(&self.filter, *index, new_items),
                    ListChange::Move {
                        old_index,
                        new_index,
                        items,
                    } => state.on_move(*old_index, *new_index, items.len()),
                    ListChange::Reset => self.resync(&mut state),
                }
            }
        };
        self.subscribers.notify_all(&changes);
    }

    fn resync(&self, state: &mut FilterState<T>) -> Vec<ListChange<T>> {
        *state = FilterState::build(&self.filter, self.source.to_vec());
        #[cfg(feature = "tracing")]
        tracing::debug!(
            message = "collections.filtered.reset",
            source_len = state.included.len(),
            accepted = state.items.len()
        );
        vec![ListChange::Reset]
    }
}

/// A live, read-only view of the elements of a source list accepted by a
/// [`Filter`].
///
/// Cloning creates a new handle to the **same** view.
pub struct FilteredView<T: Clone + 'static> {
    inner: Rc<FilteredInner<T>>,
}

impl<T: Clone + 'static> Clone for FilteredView<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for FilteredView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilteredView")
            .field("filter", &self.inner.filter)
            .field("items", &self.inner.state.borrow().items)
            .finish()
    }
}

impl<T: Clone + 'static> FilteredView<T> {
    /// Bind a view to `source`. The initial contents are computed in one pass.
    pub fn new<L>(source: &L, filter: Filter<T>) -> Self
    where
        L: ObservableList<Item = T> + Clone + 'static,
    {
        let state = FilterState::build(&filter, source.to_vec());
        let inner = Rc::new(FilteredInner {
            filter,
            source: Box::new(source.clone()),
            state: RefCell::new(state),
            subscribers: Subscribers::new(),
            source_subscription: RefCell::new(None),
        });
        let weak = Rc::downgrade(&inner);
        let subscription = source.subscribe(move |change| {
            if let Some(inner) = weak.upgrade() {
                inner.on_source_change(change);
            }
        });
        *inner.source_subscription.borrow_mut() = Some(subscription);
        Self { inner }
    }

    #[must_use]
    pub fn filter(&self) -> &Filter<T> {
        &self.inner.filter
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.borrow().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.state.borrow().items.get(index).cloned()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.state.borrow().items.clone()
    }

    /// Borrow the contents without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.state.borrow().items)
    }

    /// Source position of the element at `view_index`.
    #[must_use]
    pub fn source_index_of(&self, view_index: usize) -> Option<usize> {
        self.inner
            .state
            .borrow()
            .included
            .iter()
            .enumerate()
            .filter(|&(_, &f)| f)
            .nth(view_index)
            .map(|(index, _)| index)
    }

    /// Re-evaluate the filter over the current source contents.
    ///
    /// Use this when acceptance changed without a source notification (the
    /// predicate reads external state, or elements were mutated through
    /// shared interior mutability). Sends one `Add`/`Remove` per contiguous
    /// run of elements whose inclusion flipped.
    pub fn refresh(&self) {
        self.inner.subscribers.debug_assert_idle();
        let snapshot = self.inner.source.to_vec();
        let changes = {
            let mut state = self.inner.state.borrow_mut();
            if snapshot.len() == state.included.len() {
                state.refresh(&self.inner.filter, &snapshot)
            } else {
                *state = FilterState::build(&self.inner.filter, snapshot);
                vec![ListChange::Reset]
            }
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(
            message = "collections.filtered.refresh",
            added = changes.iter().map(|c| c.new_items().len()).sum::<usize>(),
            removed = changes.iter().map(|c| c.old_items().len()).sum::<usize>()
        );
        self.inner.subscribers.notify_all(&changes);
    }
}

impl<T: Clone + 'static> ObservableList for FilteredView<T> {
    type Item = T;

    fn len(&self) -> usize {
        FilteredView::len(self)
    }

    fn get(&self, index: usize) -> Option<T> {
        FilteredView::get(self, index)
    }

    fn to_vec(&self) -> Vec<T> {
        FilteredView::to_vec(self)
    }

    fn subscribe_with(&self, callback: Rc<ChangeCallback<T>>) -> Subscription {
        self.inner.subscribers.subscribe(callback)
    }
}
