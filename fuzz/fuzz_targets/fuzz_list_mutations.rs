#![no_main]

use std::cell::RefCell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use ftui_collections::{ListChange, ListMut, ObservableList, ObservableVec, Subscription};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Op {
    Push(i8),
    InsertRange { index: u8, items: Vec<i8> },
    Set { index: u8, value: i8 },
    MoveRange { from: u8, to: u8, count: u8 },
    RemoveRange { index: u8, count: u8 },
    RemoveAll { modulus: u8 },
    ReverseInsert { index: u8, value: i8 },
    ReverseRemove { index: u8 },
    Clear,
}

#[derive(Arbitrary, Debug)]
struct Input {
    initial: Vec<i8>,
    window: (u8, u8),
    ops: Vec<Op>,
}

type Log<T> = Rc<RefCell<Vec<ListChange<T>>>>;

fn record<L: ObservableList>(list: &L) -> (Log<L::Item>, Subscription) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let sub = list.subscribe(move |change| sink.borrow_mut().push(change.clone()));
    (log, sub)
}

fn check<L: ObservableList>(list: &L, log: &Log<L::Item>, mirror: &mut Vec<L::Item>)
where
    L::Item: PartialEq + std::fmt::Debug,
{
    for change in log.borrow_mut().drain(..) {
        match change.apply_to(mirror) {
            Ok(true) => {}
            Ok(false) => *mirror = list.to_vec(),
            Err(err) => panic!("change {change:?} does not fit mirror: {err}"),
        }
    }
    assert_eq!(*mirror, list.to_vec());
}

fuzz_target!(|input: Input| {
    if input.ops.len() > 256 {
        return;
    }
    let list = ObservableVec::from_vec(input.initial);
    let evens = list.filter_by(|v: &i8| v % 2 == 0);
    let reversed = list.reversed();
    let window = list.range(usize::from(input.window.0 % 16), usize::from(input.window.1 % 16));

    let (list_log, _a) = record(&list);
    let (evens_log, _b) = record(&evens);
    let (rev_log, _c) = record(&reversed);
    let (window_log, _d) = record(&window);
    let mut list_mirror = list.to_vec();
    let mut evens_mirror = evens.to_vec();
    let mut rev_mirror = reversed.to_vec();
    let mut window_mirror = window.to_vec();

    for op in input.ops {
        // Out-of-range arguments must fail without side effects, so the
        // results are ignored here and consistency is checked below.
        match op {
            Op::Push(v) => list.push(v),
            Op::InsertRange { index, items } => {
                let _ = list.insert_range(usize::from(index), items);
            }
            Op::Set { index, value } => {
                let _ = list.set(usize::from(index), value);
            }
            Op::MoveRange { from, to, count } => {
                let _ = list.move_range(usize::from(from), usize::from(to), usize::from(count % 8));
            }
            Op::RemoveRange { index, count } => {
                let _ = list.remove_range(usize::from(index), usize::from(count % 8));
            }
            Op::RemoveAll { modulus } => {
                let m = i8::try_from(modulus % 5 + 2).unwrap_or(2);
                list.remove_all(|v| v % m == 0);
            }
            Op::ReverseInsert { index, value } => {
                let _ = reversed.insert(usize::from(index), value);
            }
            Op::ReverseRemove { index } => {
                let _ = reversed.remove_at(usize::from(index));
            }
            Op::Clear => list.clear(),
        }

        check(&list, &list_log, &mut list_mirror);
        check(&evens, &evens_log, &mut evens_mirror);
        check(&reversed, &rev_log, &mut rev_mirror);
        check(&window, &window_log, &mut window_mirror);

        let expected: Vec<i8> = list.to_vec().into_iter().filter(|v| v % 2 == 0).collect();
        assert_eq!(evens.to_vec(), expected);
    }
});
