#![forbid(unsafe_code)]

//! Binary search over already-ordered slices.
//!
//! All searches share the [`slice::binary_search`] result convention:
//!
//! - `Ok(index)`: an element comparing equal to the target sits at `index`.
//!   When several do, any one of them may be reported.
//! - `Err(index)`: no element compares equal; `index` is where the target
//!   would be inserted to keep the slice ordered, i.e. the position of the
//!   first element greater than the target (or `len` if none is).
//!
//! # Preconditions
//!
//! The slice must already be ordered by the comparer (or key + comparer) in
//! use. This is not checked; an unordered slice yields an unspecified, but
//! in-bounds, result.

use std::cmp::Ordering;

/// Search with a closure that reports how an element compares to the
/// (implicit) target.
pub fn binary_search_by<T>(
    seq: &[T],
    compare: impl FnMut(&T) -> Ordering,
) -> Result<usize, usize> {
    seq.binary_search_by(compare)
}

/// Search for `target` using its natural ordering.
pub fn binary_search<T: Ord>(seq: &[T], target: &T) -> Result<usize, usize> {
    seq.binary_search(target)
}

/// Search for `target` using an explicit comparer.
pub fn binary_search_with<T>(
    seq: &[T],
    target: &T,
    comparer: impl Fn(&T, &T) -> Ordering,
) -> Result<usize, usize> {
    seq.binary_search_by(|element| comparer(element, target))
}

/// Search for an element whose projected key compares equal to `key`.
///
/// When several elements share the key, any one matching index may be
/// returned.
pub fn binary_search_by_key<T, K>(
    seq: &[T],
    key: &K,
    key_of: impl Fn(&T) -> K,
    comparer: impl Fn(&K, &K) -> Ordering,
) -> Result<usize, usize> {
    seq.binary_search_by(|element| comparer(&key_of(element), key))
}

/// First index whose element is not less than the target.
pub fn lower_bound_by<T>(seq: &[T], mut compare: impl FnMut(&T) -> Ordering) -> usize {
    seq.partition_point(|element| compare(element) == Ordering::Less)
}

/// First index whose element is greater than the target.
///
/// Inserting at this position places a new element after every existing
/// element that compares equal to it.
pub fn upper_bound_by<T>(seq: &[T], mut compare: impl FnMut(&T) -> Ordering) -> usize {
    seq.partition_point(|element| compare(element) != Ordering::Greater)
}
