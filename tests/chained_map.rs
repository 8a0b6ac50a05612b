// ChainedMap integration tests.
//
// Each test states the behaviour under test. Core invariants exercised:
// - Load factor: after any successful insert, len / slot_count <= max.
// - Uniqueness: duplicate inserts are rejected and the old value survives.
// - Traversal: every entry once, bucket order then chain order.
// - Lifecycle: reclaim callbacks run exactly once per key and per value.
// - Identity: entries (and their handles) survive growth and resize.
use chained_map::{
    ChainedMap, Erase, FnReclaim, GrowthPolicy, Insert, MapBuilder, MapError, Resize, StdKeyOps,
};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

fn sum_hash(k: &&str) -> u64 {
    k.bytes().map(u64::from).sum()
}

fn str_eq(a: &&str, b: &&str) -> bool {
    a == b
}

// Scenario: 10 slots at 0.5 grow exactly on the sixth insert.
#[test]
fn grows_on_the_insert_that_would_exceed_the_bound() {
    let mut m = ChainedMap::with_fns(sum_hash, str_eq, 10, 0.5).unwrap();
    let keys = ["a", "b", "c", "d", "e", "f"];
    for (i, k) in keys.iter().enumerate() {
        let before = m.slot_count();
        assert!(m.insert(*k, i).unwrap().is_inserted());
        if i < 5 {
            assert_eq!(m.slot_count(), before, "premature growth at insert {}", i + 1);
        }
    }
    assert!(m.slot_count() > 10);
    assert_eq!(m.len(), 6);
    assert!(m.load_factor() <= 0.5);
    for (i, k) in keys.iter().enumerate() {
        assert_eq!(m.get(k), Some(&i));
    }
}

// Scenario: erase one of three entries; traversal yields the other two.
#[test]
fn erase_then_traverse_yields_the_rest() {
    let mut m = ChainedMap::with_fns(sum_hash, str_eq, 16, 1.0).unwrap();
    for (k, v) in [("War", 1.1), ("Goo", 2.2), ("Door", 3.3)] {
        assert!(m.insert(k, v).unwrap().is_inserted());
    }
    assert_eq!(m.erase(&"War", ()), Erase::Removed);

    let mut seen = BTreeMap::new();
    let mut order = Vec::new();
    let pending_key = Cell::new(None);
    m.for_each(
        |k| pending_key.set(Some(*k)),
        |v| {
            let k = pending_key.take().expect("key action runs first");
            order.push(k);
            seen.insert(k, *v);
        },
    );
    assert_eq!(seen, BTreeMap::from([("Door", 3.3), ("Goo", 2.2)]));
    assert_eq!(m.len(), 2);

    // for_each and iter agree on order: ascending bucket index.
    let iter_order: Vec<&str> = m.iter().map(|(k, _)| *k).collect();
    assert_eq!(order, iter_order);
    let buckets: Vec<u64> = order.iter().map(|k| sum_hash(k) % 16).collect();
    let mut sorted = buckets.clone();
    sorted.sort_unstable();
    assert_eq!(buckets, sorted);
}

// Scenario: reject policy keeps the first value.
#[test]
fn duplicate_insert_keeps_first_value() {
    let mut m: ChainedMap<String, f64> = ChainedMap::new();
    assert!(m.insert("k".to_string(), 1.0).unwrap().is_inserted());
    match m.insert("k".to_string(), 2.0).unwrap() {
        Insert::DuplicateKey { value, .. } => assert_eq!(value, 2.0),
        other => panic!("expected duplicate, got {:?}", other),
    }
    assert_eq!(m.get("k"), Some(&1.0));
    assert_eq!(m.len(), 1);
}

#[test]
fn resize_zero_only_when_empty() {
    let mut m: ChainedMap<u64, u64> = ChainedMap::new();
    assert_eq!(m.resize(0), Ok(Resize::Unchanged));
    let _ = m.insert(1, 1).unwrap();
    assert!(matches!(m.resize(0), Err(MapError::InvalidOperation(_))));
    assert_eq!(m.get(&1), Some(&1));
    assert_eq!(m.erase(&1, ()), Erase::Removed);
    assert_eq!(m.resize(0), Ok(Resize::Changed));
    assert_eq!(m.slot_count(), 0);
}

#[test]
fn erase_is_idempotent() {
    let mut m = ChainedMap::with_fns(sum_hash, str_eq, 4, 1.0).unwrap();
    let _ = m.insert("x", ()).unwrap();
    assert_eq!(m.erase(&"x", ()), Erase::Removed);
    assert!(!m.contains(&"x"));
    assert_eq!(m.erase(&"x", ()), Erase::Absent);
}

// By-reference storage: the map holds borrowed keys and values and never
// copies what they point at.
#[test]
fn borrowed_keys_and_values() {
    let names = vec!["one".to_string(), "two".to_string(), "three".to_string()];
    let mut values = [1.0f32, 2.0, 3.0];
    {
        let mut m: ChainedMap<&str, &mut f32> = ChainedMap::new();
        for (name, value) in names.iter().zip(values.iter_mut()) {
            assert!(m.insert(name.as_str(), value).unwrap().is_inserted());
        }
        assert_eq!(m.resize(10), Ok(Resize::Changed));
        **m.get_mut("two").unwrap() = 3.25;
    }
    assert_eq!(values, [1.0, 3.25, 3.0]);
}

// Reclaim accounting: every key and value handed over exactly once, for
// erase, clear and delete alike.
#[test]
fn reclaim_runs_once_per_key_and_value() {
    let keys = Rc::new(RefCell::new(BTreeMap::<String, u32>::new()));
    let values = Rc::new(Cell::new(0u32));
    let reclaim = || {
        let keys = Rc::clone(&keys);
        let values = Rc::clone(&values);
        FnReclaim::new(
            move |k: String| *keys.borrow_mut().entry(k).or_default() += 1,
            move |_: Vec<u8>| values.set(values.get() + 1),
        )
    };

    let mut m: ChainedMap<String, Vec<u8>> = ChainedMap::new();
    for i in 0..30u8 {
        let _ = m.insert(format!("k{i}"), vec![i]).unwrap();
    }
    for i in 0..10 {
        assert_eq!(m.erase(&format!("k{i}"), reclaim()), Erase::Removed);
    }
    assert_eq!(m.erase("missing", reclaim()), Erase::Absent);
    m.clear(reclaim());
    assert_eq!(m.len(), 0);
    for i in 30..40u8 {
        let _ = m.insert(format!("k{i}"), vec![i]).unwrap();
    }
    m.delete(reclaim());

    assert_eq!(values.get(), 40);
    let keys = keys.borrow();
    assert_eq!(keys.len(), 40);
    assert!(keys.values().all(|&n| n == 1));
}

// Dropping a map releases every entry like delete(()) would.
#[test]
fn drop_releases_entries() {
    let tracker = Rc::new(());
    {
        let mut m: ChainedMap<u32, Rc<()>> = ChainedMap::new();
        for i in 0..100 {
            let _ = m.insert(i, Rc::clone(&tracker)).unwrap();
        }
        assert_eq!(Rc::strong_count(&tracker), 101);
    }
    assert_eq!(Rc::strong_count(&tracker), 1);
}

// Identity: handles taken before growth still reach the same entries.
#[test]
fn handles_survive_growth_and_shrink() {
    let mut m = MapBuilder::new()
        .key_ops(StdKeyOps::new())
        .initial_slots(2)
        .max_load_factor(1.0)
        .growth(GrowthPolicy {
            numerator: 2,
            denominator: 1,
            step: 1,
            bootstrap: 4,
        })
        .build::<u32, String>()
        .unwrap();
    let mut handles = Vec::new();
    for i in 0..64u32 {
        match m.insert(i, i.to_string()).unwrap() {
            Insert::Inserted(h) => handles.push(h),
            other => panic!("unexpected {:?}", other),
        }
    }
    assert!(m.slot_count() >= 64);
    assert_eq!(m.resize(3), Ok(Resize::Changed));
    for (i, h) in handles.iter().enumerate() {
        assert_eq!(h.value(&m), Some(&i.to_string()));
    }
    *handles[7].value_mut(&mut m).unwrap() = "seven".into();
    assert_eq!(m.get(&7), Some(&"seven".to_string()));
}

#[test]
fn failed_growth_is_all_or_nothing() {
    let mut m = MapBuilder::new()
        .key_ops(StdKeyOps::new())
        .initial_slots(1)
        .max_load_factor(1.0)
        .growth(GrowthPolicy {
            numerator: usize::MAX / 2,
            denominator: 1,
            step: 1,
            bootstrap: 1,
        })
        .build::<u8, u8>()
        .unwrap();
    assert!(m.insert(1, 10).unwrap().is_inserted());
    // The next bucket array would not fit in the address space.
    assert_eq!(m.insert(2, 20), Err(MapError::ArithmeticOverflow));
    assert_eq!(m.slot_count(), 1);
    assert_eq!(m.len(), 1);
    assert_eq!(m.get(&1), Some(&10));
    assert!(!m.contains(&2));
}

// Linear growth under a tiny load factor still finishes in one call.
#[test]
fn linear_growth_with_tiny_load_factor_terminates() {
    let linear = GrowthPolicy {
        numerator: 1,
        denominator: 1,
        step: 1,
        bootstrap: 1,
    };
    let mut m = MapBuilder::new()
        .key_ops(StdKeyOps::new())
        .initial_slots(1)
        .max_load_factor(1.0 / 1024.0)
        .growth(linear)
        .build::<u32, u32>()
        .unwrap();
    for i in 0..3 {
        assert!(m.insert(i, i).unwrap().is_inserted());
    }
    assert_eq!(m.slot_count(), 3072);
    assert!(m.load_factor() <= 1.0 / 1024.0);

    let mut tiny = MapBuilder::new()
        .key_ops(StdKeyOps::new())
        .initial_slots(1)
        .max_load_factor(1e-30)
        .growth(linear)
        .build::<u32, u32>()
        .unwrap();
    assert_eq!(tiny.insert(1, 1), Err(MapError::ArithmeticOverflow));
    assert_eq!(tiny.slot_count(), 1);
    assert!(tiny.is_empty());
}

#[test]
fn builder_requires_key_ops() {
    let res = MapBuilder::new().build::<String, f64>();
    assert!(matches!(res, Err(MapError::NullArgument(_))));
}

#[test]
fn create_validates_load_factor() {
    for bad in [0.0, 2.0, f64::NAN] {
        let res: Result<ChainedMap<&str, (), _>, _> = ChainedMap::with_fns(sum_hash, str_eq, 8, bad);
        assert!(matches!(res, Err(MapError::InvalidParameter { .. })));
    }
}
