#![no_main]

use std::cell::RefCell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use ftui_collections::{ListChange, ObservableList, SortedObservableVec};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Op {
    Add(i8),
    AddAll { items: Vec<i8>, presorted: bool },
    Remove(i8),
    RemoveAll(Vec<i8>),
    Update { index: u8, value: i8 },
    Clear,
}

fuzz_target!(|ops: Vec<Op>| {
    if ops.len() > 256 {
        return;
    }
    let list = SortedObservableVec::<i8>::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let _sub = list.subscribe(move |change: &ListChange<i8>| sink.borrow_mut().push(change.clone()));
    let mut mirror: Vec<i8> = Vec::new();

    for op in ops {
        match op {
            Op::Add(v) => {
                list.add(v);
            }
            Op::AddAll { mut items, presorted } => {
                if presorted {
                    items.sort_unstable();
                }
                list.add_all(items, presorted);
            }
            Op::Remove(v) => {
                list.remove(&v);
            }
            Op::RemoveAll(items) => {
                list.remove_all(items);
            }
            Op::Update { index, value } => {
                let _ = list.update(usize::from(index), |v| *v = value);
            }
            Op::Clear => list.clear(),
        }

        for change in log.borrow_mut().drain(..) {
            if !change.apply_to(&mut mirror).expect("change fits mirror") {
                mirror = list.to_vec();
            }
        }
        assert_eq!(mirror, list.to_vec());
        assert!(mirror.windows(2).all(|w| w[0] <= w[1]));
    }
});
