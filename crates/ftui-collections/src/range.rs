#![forbid(unsafe_code)]

//! Fixed window over an observable list.
//!
//! A [`RangeView`] shows `source[start..start + length]`, clipped to the
//! source's current length, and re-indexes on every access. Writes through
//! the view land at `start + i` in the source.
//!
//! Source changes are translated into window-relative events (`end` is
//! `start + length`):
//!
//! | Source change | View change |
//! |---|---|
//! | `Replace` overlapping the window | `Replace` of the overlapping part |
//! | `Move` with both runs inside the window | `Move` at window-relative indices |
//! | anything touching only positions at or past `end` | nothing |
//! | `Move` touching only positions before `start` | nothing |
//! | `Add` inside the window | `Add` of the part that fits, then `Remove` of the tail pushed past `end` |
//! | `Remove` inside the window | `Remove` of the visible part, then `Add` of the elements pulled in from past `end` |
//! | `Add` or `Remove` before `start` | `Remove` and `Add` of the elements shifted across the window edges |
//! | `Move` straddling the window | its `Remove` half, then its `Add` half |
//!
//! The view keeps a shadow copy of the source so the elements crossing the
//! window edges are known without reading the source mid-batch. Only a
//! source `Reset`, or a change that does not fit the shadow, becomes a
//! `Reset`.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::change::{ChangeCallback, ListChange, ListMut, ObservableList, Subscribers, Subscription};
use crate::error::{CollectionError, Result};

struct RangeInner<L: ObservableList> {
    source: L,
    start: usize,
    length: usize,
    shadow: RefCell<Vec<L::Item>>,
    subscribers: Subscribers<L::Item>,
    _source_subscription: Subscription,
}

impl<L: ObservableList> RangeInner<L> {
    fn end(&self) -> usize {
        self.start.saturating_add(self.length)
    }

    fn window<'a>(&self, items: &'a [L::Item]) -> &'a [L::Item] {
        let lo = self.start.min(items.len());
        let hi = self.end().min(items.len());
        &items[lo..hi]
    }

    fn translate(&self, change: &ListChange<L::Item>) -> Vec<ListChange<L::Item>> {
        let mut shadow = self.shadow.borrow_mut();
        if change.check_fits(shadow.len()).is_err() {
            *shadow = self.source.to_vec();
            return vec![self.reset("misfit", shadow.len())];
        }
        let end = self.end();
        match change {
            ListChange::Add { index, items } => self.on_add(&mut shadow, *index, items),
            ListChange::Remove { index, items } => self.on_remove(&mut shadow, *index, items.len()),
            ListChange::Replace {
                index,
                old_items,
                new_items,
            } => {
                let n = new_items.len();
                shadow[*index..index + n].clone_from_slice(new_items);
                let lo = (*index).max(self.start);
                let hi = (index + n).min(end);
                if lo < hi {
                    vec![ListChange::Replace {
                        index: lo - self.start,
                        old_items: old_items[lo - index..hi - index].to_vec(),
                        new_items: new_items[lo - index..hi - index].to_vec(),
                    }]
                } else {
                    Vec::new()
                }
            }
            ListChange::Move {
                old_index,
                new_index,
                items,
            } => {
                let n = items.len();
                let first = (*old_index).min(*new_index);
                let last = (*old_index).max(*new_index) + n;
                let window_end = end.min(shadow.len());
                if first >= end || last <= self.start {
                    let moved: Vec<_> = shadow.drain(*old_index..old_index + n).collect();
                    shadow.splice(*new_index..*new_index, moved);
                    Vec::new()
                } else if first >= self.start && last <= window_end {
                    let moved: Vec<_> = shadow.drain(*old_index..old_index + n).collect();
                    shadow.splice(*new_index..*new_index, moved);
                    vec![ListChange::Move {
                        old_index: old_index - self.start,
                        new_index: new_index - self.start,
                        items: items.clone(),
                    }]
                } else {
                    let mut changes = self.on_remove(&mut shadow, *old_index, n);
                    changes.extend(self.on_add(&mut shadow, *new_index, items));
                    changes
                }
            }
            ListChange::Reset => {
                *shadow = self.source.to_vec();
                vec![self.reset("source", shadow.len())]
            }
        }
    }

    /// Insert `items` at `index` in the shadow and describe the window's
    /// transition.
    fn on_add(
        &self,
        shadow: &mut Vec<L::Item>,
        index: usize,
        items: &[L::Item],
    ) -> Vec<ListChange<L::Item>> {
        let old = self.window(shadow).to_vec();
        shadow.splice(index..index, items.iter().cloned());
        let end = self.end();
        let mut changes = Vec::new();
        if index >= end || items.is_empty() {
            return changes;
        }
        if index >= self.start {
            let fit = items.len().min(end - index);
            changes.push(ListChange::Add {
                index: index - self.start,
                items: items[..fit].to_vec(),
            });
            let overflow = (old.len() + fit).saturating_sub(self.length);
            if overflow > 0 {
                changes.push(ListChange::Remove {
                    index: self.length,
                    items: old[old.len() - overflow..].to_vec(),
                });
            }
        } else {
            // Everything in the window shifts right by `items.len()`.
            let new = self.window(shadow);
            let entering = items.len().min(new.len());
            let kept = new.len() - entering;
            if kept < old.len() {
                changes.push(ListChange::Remove {
                    index: kept,
                    items: old[kept..].to_vec(),
                });
            }
            if entering > 0 {
                changes.push(ListChange::Add {
                    index: 0,
                    items: new[..entering].to_vec(),
                });
            }
        }
        changes
    }

    /// Remove `count` elements at `index` from the shadow and describe the
    /// window's transition.
    fn on_remove(
        &self,
        shadow: &mut Vec<L::Item>,
        index: usize,
        count: usize,
    ) -> Vec<ListChange<L::Item>> {
        let old = self.window(shadow).to_vec();
        shadow.drain(index..index + count);
        let mut changes = Vec::new();
        if index >= self.end() {
            return changes;
        }
        let (at, gone) = if index >= self.start {
            let visible_end = self.start + old.len();
            (index - self.start, (index + count).min(visible_end) - index)
        } else {
            // Everything in the window shifts left by `count`.
            (0, count.min(old.len()))
        };
        if gone > 0 {
            changes.push(ListChange::Remove {
                index: at,
                items: old[at..at + gone].to_vec(),
            });
        }
        let new = self.window(shadow);
        let kept = old.len() - gone;
        if new.len() > kept {
            changes.push(ListChange::Add {
                index: kept,
                items: new[kept..].to_vec(),
            });
        }
        changes
    }

    fn reset(&self, cause: &'static str, source_len: usize) -> ListChange<L::Item> {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            message = "collections.range.reset",
            cause,
            start = self.start,
            length = self.length,
            source_len
        );
        #[cfg(not(feature = "tracing"))]
        let _ = (cause, source_len);
        ListChange::Reset
    }
}

/// A live, writable window onto a source list.
pub struct RangeView<L: ObservableList> {
    inner: Rc<RangeInner<L>>,
}

impl<L: ObservableList> Clone for RangeView<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<L: ObservableList> fmt::Debug for RangeView<L>
where
    L::Item: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeView")
            .field("start", &self.inner.start)
            .field("length", &self.inner.length)
            .field("items", &self.to_vec())
            .finish()
    }
}

impl<L: ObservableList + Clone + 'static> RangeView<L> {
    pub fn new(source: &L, start: usize, length: usize) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<RangeInner<L>>| {
            let weak = weak.clone();
            let subscription = source.subscribe(move |change| {
                if let Some(inner) = weak.upgrade() {
                    let translated = inner.translate(change);
                    inner.subscribers.notify_all(&translated);
                }
            });
            RangeInner {
                source: source.clone(),
                start,
                length,
                shadow: RefCell::new(source.to_vec()),
                subscribers: Subscribers::new(),
                _source_subscription: subscription,
            }
        });
        Self { inner }
    }
}

impl<L: ObservableList> RangeView<L> {
    #[must_use]
    pub fn start(&self) -> usize {
        self.inner.start
    }

    /// Requested window length; the visible length may be shorter.
    #[must_use]
    pub fn length(&self) -> usize {
        self.inner.length
    }

    #[must_use]
    pub fn source(&self) -> &L {
        &self.inner.source
    }
}

impl<L: ObservableList> ObservableList for RangeView<L> {
    type Item = L::Item;

    fn len(&self) -> usize {
        self.inner
            .length
            .min(self.inner.source.len().saturating_sub(self.inner.start))
    }

    fn get(&self, index: usize) -> Option<L::Item> {
        if index < self.len() {
            self.inner.source.get(self.inner.start + index)
        } else {
            None
        }
    }

    fn subscribe_with(&self, callback: Rc<ChangeCallback<L::Item>>) -> Subscription {
        self.inner.subscribers.subscribe(callback)
    }
}

impl<L: ListMut> ListMut for RangeView<L> {
    fn set(&self, index: usize, value: L::Item) -> Result<L::Item> {
        CollectionError::check_index(index, self.len())?;
        self.inner.source.set(self.inner.start + index, value)
    }

    fn insert_range(&self, index: usize, items: Vec<L::Item>) -> Result<()> {
        CollectionError::check_insert(index, self.len())?;
        self.inner.source.insert_range(self.inner.start + index, items)
    }

    fn remove_range(&self, index: usize, count: usize) -> Result<Vec<L::Item>> {
        CollectionError::check_range(index, count, self.len())?;
        self.inner.source.remove_range(self.inner.start + index, count)
    }

    fn move_range(&self, old_index: usize, new_index: usize, count: usize) -> Result<()> {
        let len = self.len();
        CollectionError::check_range(old_index, count, len)?;
        CollectionError::check_range(new_index, count, len)?;
        self.inner.source.move_range(
            self.inner.start + old_index,
            self.inner.start + new_index,
            count,
        )
    }
}
