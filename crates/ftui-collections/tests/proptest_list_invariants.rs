//! Property-based invariant tests for `ObservableVec` and its derived views.
//!
//! Every test drives a random mutation script through the public API and
//! checks:
//!
//! 1. Replaying the sent changes onto a shadow copy reproduces the list.
//! 2. A filtered view equals `source.filter(predicate)` after every step.
//! 3. An identity filter sends exactly the changes its source sends.
//! 4. A reversed view equals the reversed source, and its changes replay,
//!    whether the script runs through the source or through the view.
//! 5. A range view equals the clipped window, and its changes replay.
//! 6. A converted view equals the mapped source, and its changes replay.
//! 7. Out-of-range mutators fail without sending anything.

use std::cell::RefCell;
use std::rc::Rc;

use ftui_collections::{Filter, ListChange, ListMut, ObservableList, ObservableVec, Subscription};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Push(i32),
    Extend(Vec<i32>),
    InsertRange(usize, Vec<i32>),
    Set(usize, i32),
    MoveRange(usize, usize, usize),
    RemoveRange(usize, usize),
    RemoveAll(i32),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (-50i32..50).prop_map(Op::Push),
        2 => proptest::collection::vec(-50i32..50, 0..6).prop_map(Op::Extend),
        3 => (any::<usize>(), proptest::collection::vec(-50i32..50, 1..5))
            .prop_map(|(i, items)| Op::InsertRange(i, items)),
        3 => (any::<usize>(), -50i32..50).prop_map(|(i, v)| Op::Set(i, v)),
        3 => (any::<usize>(), any::<usize>(), 1usize..4)
            .prop_map(|(a, b, n)| Op::MoveRange(a, b, n)),
        2 => (any::<usize>(), 1usize..4).prop_map(|(i, n)| Op::RemoveRange(i, n)),
        2 => (2i32..6).prop_map(Op::RemoveAll),
        1 => Just(Op::Clear),
    ]
}

fn script() -> impl Strategy<Value = (Vec<i32>, Vec<Op>)> {
    (
        proptest::collection::vec(-50i32..50, 0..20),
        proptest::collection::vec(op(), 0..40),
    )
}

/// Apply `op` with indices folded into range, so most steps succeed.
fn apply(list: &ObservableVec<i32>, op: &Op) {
    let len = list.len();
    match op {
        Op::Push(v) => list.push(*v),
        Op::Extend(items) => list.extend(items.iter().copied()),
        Op::InsertRange(i, items) => {
            list.insert_range(i % (len + 1), items.iter().copied()).unwrap();
        }
        Op::Set(i, v) if len > 0 => {
            list.set(i % len, *v).unwrap();
        }
        Op::MoveRange(a, b, n) if len > 0 => {
            let n = (*n).min(len);
            let slots = len - n + 1;
            list.move_range(a % slots, b % slots, n).unwrap();
        }
        Op::RemoveRange(i, n) if len > 0 => {
            let i = i % len;
            list.remove_range(i, (*n).min(len - i)).unwrap();
        }
        Op::RemoveAll(m) => {
            list.remove_all(|v| v.rem_euclid(*m) == 0);
        }
        Op::Clear => list.clear(),
        _ => {}
    }
}

/// Apply `op` through a writable view. Bulk removal and clear have no
/// `ListMut` counterpart and go to `source` instead.
fn apply_through<L: ListMut<Item = i32>>(view: &L, source: &ObservableVec<i32>, op: &Op) {
    let len = view.len();
    match op {
        Op::Push(v) => view.push(*v).unwrap(),
        Op::Extend(items) => view.insert_range(len, items.clone()).unwrap(),
        Op::InsertRange(i, items) => view.insert_range(i % (len + 1), items.clone()).unwrap(),
        Op::Set(i, v) if len > 0 => {
            view.set(i % len, *v).unwrap();
        }
        Op::MoveRange(a, b, n) if len > 0 => {
            let n = (*n).min(len);
            let slots = len - n + 1;
            view.move_range(a % slots, b % slots, n).unwrap();
        }
        Op::RemoveRange(i, n) if len > 0 => {
            let i = i % len;
            view.remove_range(i, (*n).min(len - i)).unwrap();
        }
        Op::RemoveAll(_) | Op::Clear => apply(source, op),
        _ => {}
    }
}

type Log<T> = Rc<RefCell<Vec<ListChange<T>>>>;

fn record<L: ObservableList>(list: &L) -> (Log<L::Item>, Subscription) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let sub = list.subscribe(move |change| sink.borrow_mut().push(change.clone()));
    (log, sub)
}

/// Replay and drain `log` onto `mirror`, re-reading `list` on `Reset`.
fn replay<L: ObservableList>(log: &Log<L::Item>, mirror: &mut Vec<L::Item>, list: &L) {
    for change in log.borrow_mut().drain(..) {
        if !change.apply_to(mirror).expect("change fits mirror") {
            *mirror = list.to_vec();
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Change replay reproduces the list
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn replay_reproduces_source((initial, ops) in script()) {
        let list = ObservableVec::from_vec(initial);
        let (log, _sub) = record(&list);
        let mut mirror = list.to_vec();
        for op in &ops {
            apply(&list, op);
            replay(&log, &mut mirror, &list);
            prop_assert_eq!(&mirror, &list.to_vec(), "after {:?}", op);
        }
    }

    #[test]
    fn only_clear_sends_reset((initial, ops) in script()) {
        let list = ObservableVec::from_vec(initial);
        let (log, _sub) = record(&list);
        for op in &ops {
            apply(&list, op);
            let resets = log.borrow().iter().filter(|c| **c == ListChange::Reset).count();
            prop_assert_eq!(resets, usize::from(matches!(op, Op::Clear)));
            for change in log.borrow().iter() {
                if let ListChange::Move { old_index, new_index, .. } = change {
                    prop_assert_ne!(old_index, new_index);
                }
                if !matches!(change, ListChange::Reset) {
                    prop_assert!(!change.new_items().is_empty() || !change.old_items().is_empty());
                }
            }
            log.borrow_mut().clear();
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2-3. Filtered views
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn filtered_view_tracks_source((initial, ops) in script(), modulus in 2i32..5) {
        let list = ObservableVec::from_vec(initial);
        let view = list.filter_by(move |v| v.rem_euclid(modulus) == 0);
        let (log, _sub) = record(&view);
        let mut mirror = view.to_vec();
        for op in &ops {
            apply(&list, op);
            let expected: Vec<i32> = list
                .to_vec()
                .into_iter()
                .filter(|v| v.rem_euclid(modulus) == 0)
                .collect();
            prop_assert_eq!(&view.to_vec(), &expected, "after {:?}", op);
            replay(&log, &mut mirror, &view);
            prop_assert_eq!(&mirror, &expected);
        }
    }

    #[test]
    fn identity_filter_forwards_source_changes((initial, ops) in script()) {
        let list = ObservableVec::from_vec(initial);
        let view = list.filtered(Filter::All);
        let (source_log, _a) = record(&list);
        let (view_log, _b) = record(&view);
        for op in &ops {
            apply(&list, op);
        }
        prop_assert_eq!(&*view_log.borrow(), &*source_log.borrow());
        prop_assert_eq!(view.to_vec(), list.to_vec());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4-5. Index-remapping views
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reversed_view_mirrors_source((initial, ops) in script()) {
        let list = ObservableVec::from_vec(initial);
        let view = list.reversed();
        let (log, _sub) = record(&view);
        let mut mirror = view.to_vec();
        for op in &ops {
            apply(&list, op);
            let mut expected = list.to_vec();
            expected.reverse();
            prop_assert_eq!(&view.to_vec(), &expected);
            replay(&log, &mut mirror, &view);
            prop_assert_eq!(&mirror, &expected, "after {:?}", op);
        }
    }

    #[test]
    fn range_view_tracks_window(
        (initial, ops) in script(),
        start in 0usize..8,
        length in 0usize..8,
    ) {
        let list = ObservableVec::from_vec(initial);
        let view = list.range(start, length);
        let (log, _sub) = record(&view);
        let mut mirror = view.to_vec();
        for op in &ops {
            apply(&list, op);
            let expected: Vec<i32> = list.to_vec().into_iter().skip(start).take(length).collect();
            prop_assert_eq!(&view.to_vec(), &expected);
            replay(&log, &mut mirror, &view);
            prop_assert_eq!(&mirror, &expected, "after {:?}", op);
        }
    }

    #[test]
    fn script_through_reversed_view((initial, ops) in script()) {
        let list = ObservableVec::from_vec(initial);
        let view = list.reversed();
        let (view_log, _a) = record(&view);
        let (source_log, _b) = record(&list);
        let mut view_mirror = view.to_vec();
        let mut source_mirror = list.to_vec();
        for op in &ops {
            apply_through(&view, &list, op);
            let mut expected = list.to_vec();
            expected.reverse();
            prop_assert_eq!(&view.to_vec(), &expected, "after {:?}", op);
            replay(&view_log, &mut view_mirror, &view);
            prop_assert_eq!(&view_mirror, &expected, "after {:?}", op);
            replay(&source_log, &mut source_mirror, &list);
            prop_assert_eq!(&source_mirror, &list.to_vec());
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Converted views
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn converted_view_tracks_source((initial, ops) in script()) {
        let list = ObservableVec::from_vec(initial);
        let view = list.converted(|v| i64::from(*v) * 3 + 1);
        let (log, _sub) = record(&view);
        let mut mirror = view.to_vec();
        for op in &ops {
            apply(&list, op);
            let expected: Vec<i64> = list.to_vec().iter().map(|v| i64::from(*v) * 3 + 1).collect();
            prop_assert_eq!(&view.to_vec(), &expected);
            replay(&log, &mut mirror, &view);
            prop_assert_eq!(&mirror, &expected, "after {:?}", op);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Failing mutators are silent
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn out_of_range_mutations_fail_cleanly(
        initial in proptest::collection::vec(-50i32..50, 0..10),
        extra in 1usize..5,
    ) {
        let list = ObservableVec::from_vec(initial.clone());
        let (log, _sub) = record(&list);
        let len = list.len();
        prop_assert!(list.set(len, 0).is_err());
        prop_assert!(list.insert(len + extra, 0).is_err());
        prop_assert!(list.remove_range(len, extra).is_err());
        prop_assert!(list.move_range(0, len, extra).is_err());
        prop_assert!(list.remove_at(len).is_err());
        prop_assert!(log.borrow().is_empty());
        prop_assert_eq!(list.to_vec(), initial);
    }
}
