#![forbid(unsafe_code)]

//! Element-wise converted view.
//!
//! [`ConvertedView<S, D>`] presents `source[i]` as `convert(&source[i])`.
//! Elements are converted on read; nothing is cached. Source changes are
//! forwarded with the same indices and converted payloads.

use std::fmt;
use std::rc::Rc;

use crate::change::{ChangeCallback, ObservableList, Subscribers, Subscription};

type Converter<S, D> = Rc<dyn Fn(&S) -> D>;

struct ConvertedInner<S: Clone + 'static, D> {
    source: Box<dyn ObservableList<Item = S>>,
    convert: Converter<S, D>,
    subscribers: Subscribers<D>,
    _source_subscription: Subscription,
}

/// A live, read-only view applying a conversion to each source element.
pub struct ConvertedView<S: Clone + 'static, D> {
    inner: Rc<ConvertedInner<S, D>>,
}

impl<S: Clone + 'static, D> Clone for ConvertedView<S, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: Clone + 'static, D> fmt::Debug for ConvertedView<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertedView")
            .field("len", &self.inner.source.len())
            .field("subscribers", &self.inner.subscribers)
            .finish()
    }
}

impl<S: Clone + 'static, D: Clone + 'static> ConvertedView<S, D> {
    pub fn new<L>(source: &L, convert: impl Fn(&S) -> D + 'static) -> Self
    where
        L: ObservableList<Item = S> + Clone + 'static,
    {
        let convert: Converter<S, D> = Rc::new(convert);
        let inner = Rc::new_cyclic(|weak: &std::rc::Weak<ConvertedInner<S, D>>| {
            let weak = weak.clone();
            let subscription = source.subscribe(move |change| {
                if let Some(inner) = weak.upgrade() {
                    let converted = change.map(|item| (inner.convert)(item));
                    inner.subscribers.notify(&converted);
                }
            });
            ConvertedInner {
                source: Box::new(source.clone()),
                convert,
                subscribers: Subscribers::new(),
                _source_subscription: subscription,
            }
        });
        Self { inner }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.source.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<D> {
        self.inner.source.get(index).map(|item| (self.inner.convert)(&item))
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<D> {
        self.inner
            .source
            .to_vec()
            .iter()
            .map(|item| (self.inner.convert)(item))
            .collect()
    }
}

impl<S: Clone + 'static, D: Clone + 'static> ObservableList for ConvertedView<S, D> {
    type Item = D;

    fn len(&self) -> usize {
        ConvertedView::len(self)
    }

    fn get(&self, index: usize) -> Option<D> {
        ConvertedView::get(self, index)
    }

    fn to_vec(&self) -> Vec<D> {
        ConvertedView::to_vec(self)
    }

    fn subscribe_with(&self, callback: Rc<ChangeCallback<D>>) -> Subscription {
        self.inner.subscribers.subscribe(callback)
    }
}
