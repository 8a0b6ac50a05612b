#![cfg(test)]

// Property tests for ChainedMap kept inside the crate so they can check the
// bucket chains directly, not only the public surface.

use crate::chained_map::{ChainedMap, Erase, Handle, Insert, Resize};
use crate::config::MapBuilder;
use crate::error::MapError;
use crate::key_ops::{FnKeyOps, KeyOps, StdKeyOps};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Keys are drawn from a small pool by index so shrinking moves towards
// earlier keys and shorter op lists.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Erase(usize),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Resize(usize),
    Clear,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            1 => idx.clone().prop_map(Op::Erase),
            1 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::Get),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(Op::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => (0usize..40).prop_map(Op::Resize),
            1 => Just(Op::Clear),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

/// Structural invariants that must hold between operations.
fn check_structure<K, V, O>(sut: &ChainedMap<K, V, O>) -> Result<(), TestCaseError> {
    if sut.slot_count() == 0 {
        prop_assert!(sut.is_empty(), "entries without buckets");
    }
    prop_assert_eq!(sut.iter().count(), sut.len());
    prop_assert_eq!(sut.iter().len(), sut.len());
    Ok(())
}

fn run_state_machine<O>(
    mut sut: ChainedMap<Key, i32, O>,
    pool: Vec<String>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError>
where
    O: KeyOps<Key> + KeyOps<str>,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut live: HashMap<Key, Handle> = HashMap::new();

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                match sut.insert(k.clone(), v).expect("insert must not fail") {
                    Insert::Inserted(h) => {
                        prop_assert!(!already, "insert must reject duplicates");
                        live.insert(k.clone(), h);
                        model.insert(k, v);
                        prop_assert!(sut.load_factor() <= sut.max_load_factor());
                    }
                    Insert::DuplicateKey { key, value } => {
                        prop_assert!(already, "duplicate reported for a new key");
                        prop_assert_eq!(&key, &k);
                        prop_assert_eq!(value, v);
                    }
                }
            }
            Op::Erase(i) => {
                let k = key_from(&pool, i);
                let expected = if model.remove(&k).is_some() {
                    Erase::Removed
                } else {
                    Erase::Absent
                };
                prop_assert_eq!(sut.erase(&k, ()), expected);
                live.remove(&k);
            }
            Op::Remove(i) => {
                let k = key_from(&pool, i);
                let got = sut.remove(k.0.as_str());
                prop_assert_eq!(got, model.remove_entry(&k));
                if let Some(h) = live.remove(&k) {
                    prop_assert!(h.value(&sut).is_none(), "handle outlived its entry");
                }
            }
            Op::Get(i) => {
                let k = key_from(&pool, i);
                prop_assert_eq!(sut.get(&k), model.get(&k));
                if let Some(&h) = live.get(&k) {
                    prop_assert_eq!(sut.find(&k), Some(h));
                    prop_assert_eq!(h.value(&sut), model.get(&k));
                }
            }
            Op::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains(s.as_str()), has_model);
            }
            Op::Mutate(i, d) => {
                let k = key_from(&pool, i);
                if let Some(v) = sut.get_mut(&k) {
                    *v = v.wrapping_add(d);
                }
                if let Some(mv) = model.get_mut(&k) {
                    *mv = mv.wrapping_add(d);
                }
            }
            Op::Resize(n) => {
                let before = sut.slot_count();
                match sut.resize(n) {
                    Ok(Resize::Unchanged) => prop_assert_eq!(n, before),
                    Ok(Resize::Changed) => prop_assert_eq!(sut.slot_count(), n),
                    Err(MapError::InvalidOperation(_)) => {
                        prop_assert_eq!(n, 0);
                        prop_assert!(!model.is_empty());
                        prop_assert_eq!(sut.slot_count(), before);
                    }
                    Err(e) => prop_assert!(false, "unexpected resize error {:?}", e),
                }
            }
            Op::Clear => {
                let slots = sut.slot_count();
                sut.clear(());
                model.clear();
                live.clear();
                prop_assert_eq!(sut.slot_count(), slots);
            }
            Op::Iterate => {
                let s_keys: Vec<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                let unique: BTreeSet<_> = s_keys.iter().cloned().collect();
                prop_assert_eq!(unique.len(), s_keys.len(), "entry visited twice");
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(unique, m_keys);
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        for (k, &h) in &live {
            prop_assert_eq!(h.key(&sut), Some(k));
        }
        check_structure(&sut)?;
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// - Duplicate keys are rejected; the rejected pair is handed back.
// - Load factor stays within bound after every successful insert.
// - Handles stay attached to their entry across growth and resize.
// - erase/remove/clear agree with the model; resize(0) only when empty.
// - iter yields each live entry exactly once.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario(), slots in 0usize..8, lf in 1u32..=10) {
        let sut = MapBuilder::new()
            .key_ops(StdKeyOps::new())
            .initial_slots(slots)
            .max_load_factor(f64::from(lf) / 10.0)
            .build()
            .unwrap();
        run_state_machine(sut, pool, ops)?;
    }
}

// Every key hashes to the same value: one long chain stresses the
// cached-hash prefilter and the previous-link bookkeeping in erase.
#[derive(Clone, Copy, Debug, Default)]
struct Collide;
impl<Q: ?Sized + Eq> KeyOps<Q> for Collide {
    fn hash(&self, _key: &Q) -> u64 {
        0
    }
    fn eq(&self, a: &Q, b: &Q) -> bool {
        a == b
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario(), slots in 0usize..4) {
        let sut = ChainedMap::create(Collide, slots, 1.0).unwrap();
        run_state_machine(sut, pool, ops)?;
    }
}

// Low-entropy hash through plain functions: many but not all keys collide.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_fn_ops_agree_with_model(keys in proptest::collection::vec(0u16..64, 0..200)) {
        let mut sut = ChainedMap::create(
            FnKeyOps::new(|k: &u16| u64::from(*k % 5), |a: &u16, b: &u16| a == b),
            3,
            0.75,
        )
        .unwrap();
        let mut model = BTreeSet::new();
        for k in keys {
            let fresh = model.insert(k);
            prop_assert_eq!(sut.insert(k, ()).unwrap().is_inserted(), fresh);
        }
        prop_assert_eq!(sut.len(), model.len());
        let seen: BTreeSet<u16> = sut.iter().map(|(k, _)| *k).collect();
        prop_assert_eq!(seen, model);
    }
}
