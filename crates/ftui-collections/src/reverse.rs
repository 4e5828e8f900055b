#![forbid(unsafe_code)]

//! Reversed view over an observable list.
//!
//! View position `i` maps to source position `len - 1 - i`. Reads, writes
//! and change notifications are all translated through that mapping; a run
//! `k..k + n` in the source is the run `len - k - n..len - k` in the view,
//! with its elements in reverse order.
//!
//! Source changes are translated against the length the view last saw, not
//! the source's current length, so batched notifications (where the source
//! has already applied the whole batch) stay consistent.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::change::{ChangeCallback, ListChange, ListMut, ObservableList, Subscribers, Subscription};
use crate::error::{CollectionError, Result};

struct ReverseInner<L: ObservableList> {
    source: L,
    seen_len: Cell<usize>,
    subscribers: Subscribers<L::Item>,
    _source_subscription: Subscription,
}

fn reversed<T: Clone>(items: &[T]) -> Vec<T> {
    items.iter().rev().cloned().collect()
}

impl<L: ObservableList> ReverseInner<L> {
    fn translate(&self, change: &ListChange<L::Item>) -> ListChange<L::Item> {
        let len = self.seen_len.get();
        if change.check_fits(len).is_err() {
            self.seen_len.set(self.source.len());
            return ListChange::Reset;
        }
        match change {
            ListChange::Add { index, items } => {
                let n = items.len();
                self.seen_len.set(len + n);
                ListChange::Add {
                    index: len - index,
                    items: reversed(items),
                }
            }
            ListChange::Remove { index, items } => {
                let n = items.len();
                self.seen_len.set(len - n);
                ListChange::Remove {
                    index: len - index - n,
                    items: reversed(items),
                }
            }
            ListChange::Replace {
                index,
                old_items,
                new_items,
            } => ListChange::Replace {
                index: len - index - new_items.len(),
                old_items: reversed(old_items),
                new_items: reversed(new_items),
            },
            ListChange::Move {
                old_index,
                new_index,
                items,
            } => {
                let n = items.len();
                ListChange::Move {
                    old_index: len - old_index - n,
                    new_index: len - new_index - n,
                    items: reversed(items),
                }
            }
            ListChange::Reset => {
                self.seen_len.set(self.source.len());
                ListChange::Reset
            }
        }
    }
}

/// A live view presenting its source back to front.
///
/// Writable when the source is: see the [`ListMut`] impl.
pub struct ReverseView<L: ObservableList> {
    inner: Rc<ReverseInner<L>>,
}

impl<L: ObservableList> Clone for ReverseView<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<L: ObservableList> fmt::Debug for ReverseView<L>
where
    L::Item: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReverseView")
            .field("items", &self.to_vec())
            .finish()
    }
}

impl<L: ObservableList + Clone + 'static> ReverseView<L> {
    pub fn new(source: &L) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<ReverseInner<L>>| {
            let weak = weak.clone();
            let subscription = source.subscribe(move |change| {
                if let Some(inner) = weak.upgrade() {
                    let translated = inner.translate(change);
                    inner.subscribers.notify(&translated);
                }
            });
            ReverseInner {
                source: source.clone(),
                seen_len: Cell::new(source.len()),
                subscribers: Subscribers::new(),
                _source_subscription: subscription,
            }
        });
        Self { inner }
    }
}

impl<L: ObservableList> ReverseView<L> {
    /// The list this view reverses.
    #[must_use]
    pub fn source(&self) -> &L {
        &self.inner.source
    }

    /// Source position of view position `index`.
    #[must_use]
    pub fn source_index_of(&self, index: usize) -> Option<usize> {
        let len = self.inner.source.len();
        (index < len).then(|| len - 1 - index)
    }
}

impl<L: ObservableList> ObservableList for ReverseView<L> {
    type Item = L::Item;

    fn len(&self) -> usize {
        self.inner.source.len()
    }

    fn get(&self, index: usize) -> Option<L::Item> {
        self.source_index_of(index)
            .and_then(|i| self.inner.source.get(i))
    }

    fn to_vec(&self) -> Vec<L::Item> {
        let mut items = self.inner.source.to_vec();
        items.reverse();
        items
    }

    fn subscribe_with(&self, callback: Rc<ChangeCallback<L::Item>>) -> Subscription {
        self.inner.subscribers.subscribe(callback)
    }
}

impl<L: ListMut> ListMut for ReverseView<L> {
    fn set(&self, index: usize, value: L::Item) -> Result<L::Item> {
        let len = self.inner.source.len();
        CollectionError::check_index(index, len)?;
        self.inner.source.set(len - 1 - index, value)
    }

    fn insert_range(&self, index: usize, mut items: Vec<L::Item>) -> Result<()> {
        let len = self.inner.source.len();
        CollectionError::check_insert(index, len)?;
        items.reverse();
        self.inner.source.insert_range(len - index, items)
    }

    fn remove_range(&self, index: usize, count: usize) -> Result<Vec<L::Item>> {
        let len = self.inner.source.len();
        CollectionError::check_range(index, count, len)?;
        let mut removed = self.inner.source.remove_range(len - index - count, count)?;
        removed.reverse();
        Ok(removed)
    }

    fn move_range(&self, old_index: usize, new_index: usize, count: usize) -> Result<()> {
        let len = self.inner.source.len();
        CollectionError::check_range(old_index, count, len)?;
        CollectionError::check_range(new_index, count, len)?;
        self.inner
            .source
            .move_range(len - old_index - count, len - new_index - count, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable_vec::ObservableVec;
    use std::cell::RefCell;

    fn record<L: ObservableList>(list: &L) -> (Rc<RefCell<Vec<ListChange<L::Item>>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let sub = list.subscribe(move |change| sink.borrow_mut().push(change.clone()));
        (log, sub)
    }

    #[test]
    fn reads_back_to_front() {
        let source = ObservableVec::from_vec(vec![1, 2, 3]);
        let view = source.reversed();
        assert_eq!(view.to_vec(), vec![3, 2, 1]);
        assert_eq!(view.get(0), Some(3));
        assert_eq!(view.get(3), None);
        assert_eq!(view.source_index_of(0), Some(2));
    }

    #[test]
    fn append_to_source_prepends_to_view() {
        let source = ObservableVec::new();
        let view = source.reversed();
        let (log, _sub) = record(&view);
        source.push(0);
        assert_eq!(view.to_vec(), vec![0]);
        source.push(2);
        assert_eq!(view.to_vec(), vec![2, 0]);
        assert_eq!(
            log.borrow()[1],
            ListChange::Add {
                index: 0,
                items: vec![2]
            }
        );
    }

    #[test]
    fn insert_through_view_lands_mirrored() {
        let source = ObservableVec::from_vec(vec![1, 2, 3]);
        let view = source.reversed();
        let (log, _sub) = record(&view);

        view.insert(0, 4).unwrap();
        assert_eq!(source.to_vec(), vec![1, 2, 3, 4]);
        assert_eq!(view.to_vec(), vec![4, 3, 2, 1]);
        assert_eq!(
            *log.borrow(),
            vec![ListChange::Add {
                index: 0,
                items: vec![4]
            }]
        );
    }

    #[test]
    fn source_changes_translate() {
        let source = ObservableVec::from_vec(vec![0, 1, 2, 3, 4]);
        let view = source.reversed();
        let (log, _sub) = record(&view);
        let mut mirror = view.to_vec();

        source.insert_range(1, [10, 11]).unwrap();
        source.remove_range(4, 2).unwrap();
        source.set(0, 9).unwrap();
        source.move_range(0, 3, 2).unwrap();
        source.remove_all(|v| *v == 11 || *v == 4);

        for change in log.borrow().iter() {
            assert_eq!(change.apply_to(&mut mirror), Ok(true));
        }
        assert_eq!(mirror, view.to_vec());
        assert_eq!(
            log.borrow()[0],
            ListChange::Add {
                index: 4,
                items: vec![11, 10]
            }
        );
    }

    #[test]
    fn writes_through_view() {
        let source = ObservableVec::from_vec(vec![1, 2, 3, 4, 5]);
        let view = source.reversed();

        assert_eq!(view.set(0, 50), Ok(5));
        assert_eq!(view.remove_range(1, 2), Ok(vec![4, 3]));
        assert_eq!(source.to_vec(), vec![1, 2, 50]);
        view.move_item(0, 2).unwrap();
        assert_eq!(view.to_vec(), vec![2, 1, 50]);
        assert_eq!(source.to_vec(), vec![50, 1, 2]);
        view.insert_range(3, vec![7, 8]).unwrap();
        assert_eq!(view.to_vec(), vec![2, 1, 50, 7, 8]);
        assert_eq!(source.to_vec(), vec![8, 7, 50, 1, 2]);
    }

    #[test]
    fn out_of_range_write_fails_without_change() {
        let source = ObservableVec::from_vec(vec![1, 2]);
        let view = source.reversed();
        let (log, _sub) = record(&view);
        assert!(view.set(2, 0).is_err());
        assert!(view.remove_range(1, 2).is_err());
        assert!(view.insert(3, 0).is_err());
        assert!(log.borrow().is_empty());
        assert_eq!(source.to_vec(), vec![1, 2]);
    }

    #[test]
    fn double_reverse_is_identity() {
        let source = ObservableVec::from_vec(vec![1, 2, 3]);
        let twice = source.reversed().reversed();
        let (source_log, _a) = record(&source);
        let (twice_log, _b) = record(&twice);
        source.insert(1, 7).unwrap();
        source.move_item(0, 3).unwrap();
        assert_eq!(twice.to_vec(), source.to_vec());
        assert_eq!(*twice_log.borrow(), *source_log.borrow());
    }
}
