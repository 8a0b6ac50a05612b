//! ChainedMap: separately chained buckets over a generational entry arena.

use crate::config;
use crate::error::{MapError, Result};
use crate::key_ops::{FnKeyOps, KeyOps, StdKeyOps};
use crate::reclaim::Reclaim;
use crate::reentrancy::DebugReentrancy;
use crate::sizing::{self, GrowthPolicy};
use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;
use slotmap::{DefaultKey, SlotMap};

pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.75;

// SlotMap indexes entries with a u32 and refuses to grow past this.
const ARENA_LIMIT: usize = (u32::MAX - 1) as usize;

/// Stable reference to one entry. Survives every rehash; resolves to `None`
/// once the entry is removed, even if its arena slot is reused.
///
/// A handle only means something to the map that issued it. Passed to a
/// different map it may resolve to, or remove, an unrelated entry there.
/// The other map stays structurally sound either way.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub fn key<'a, K, V, O>(&self, map: &'a ChainedMap<K, V, O>) -> Option<&'a K> {
        map.entries.get(self.0).map(|e| &e.key)
    }

    pub fn value<'a, K, V, O>(&self, map: &'a ChainedMap<K, V, O>) -> Option<&'a V> {
        map.entries.get(self.0).map(|e| &e.value)
    }

    pub fn value_mut<'a, K, V, O>(&self, map: &'a mut ChainedMap<K, V, O>) -> Option<&'a mut V> {
        map.entries.get_mut(self.0).map(|e| &mut e.value)
    }
}

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
    next: Option<DefaultKey>,
}

type Slots = Vec<Option<DefaultKey>>;
type Arena<K, V> = SlotMap<DefaultKey, Entry<K, V>>;

/// Outcome of [`ChainedMap::insert`]. Duplicates are rejected and the
/// rejected pair is handed back untouched.
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub enum Insert<K, V> {
    Inserted(Handle),
    DuplicateKey { key: K, value: V },
}

impl<K, V> Insert<K, V> {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Insert::Inserted(_))
    }
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Erase {
    Removed,
    Absent,
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resize {
    Changed,
    Unchanged,
}

/// A hash map with separate chaining and caller-supplied key operations.
///
/// Each entry caches the full hash of its key. Rehashing only reads cached
/// hashes, so `O::hash` runs exactly once per inserted key, and entries are
/// relinked in place: their arena slots (and [`Handle`]s) never change.
///
/// Insert keeps `len() / slot_count() <= max_load_factor()`; nothing ever
/// shrinks the bucket array except an explicit [`ChainedMap::resize`].
pub struct ChainedMap<K, V, O = StdKeyOps> {
    ops: O,
    slots: Slots,
    entries: Arena<K, V>,
    max_load_factor: f64,
    growth: GrowthPolicy,
    reentrancy: DebugReentrancy,
}

impl<K, V> ChainedMap<K, V> {
    /// Empty map without buckets, hashing with hashbrown's default hasher.
    pub fn new() -> Self {
        Self {
            ops: StdKeyOps::new(),
            slots: Vec::new(),
            entries: SlotMap::with_key(),
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            growth: GrowthPolicy::default(),
            reentrancy: DebugReentrancy::new(),
        }
    }
}

impl<K, V> Default for ChainedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, H, E> ChainedMap<K, V, FnKeyOps<H, E>>
where
    H: Fn(&K) -> u64,
    E: Fn(&K, &K) -> bool,
{
    pub fn with_fns(
        hash_fn: H,
        eq_fn: E,
        initial_slot_count: usize,
        max_load_factor: f64,
    ) -> Result<Self> {
        Self::create(
            FnKeyOps::new(hash_fn, eq_fn),
            initial_slot_count,
            max_load_factor,
        )
    }
}

impl<K, V, O> ChainedMap<K, V, O>
where
    O: KeyOps<K>,
{
    /// Validates the configuration and allocates `initial_slot_count` empty
    /// buckets (zero is allowed).
    pub fn create(ops: O, initial_slot_count: usize, max_load_factor: f64) -> Result<Self> {
        Self::with_config(
            ops,
            initial_slot_count,
            max_load_factor,
            GrowthPolicy::default(),
        )
    }

    pub(crate) fn with_config(
        ops: O,
        initial_slot_count: usize,
        max_load_factor: f64,
        growth: GrowthPolicy,
    ) -> Result<Self> {
        config::check_max_load_factor(max_load_factor)?;
        growth.validate()?;
        let slots = sizing::alloc_slots(initial_slot_count)?;
        Ok(Self {
            ops,
            slots,
            entries: SlotMap::with_key(),
            max_load_factor,
            growth,
            reentrancy: DebugReentrancy::new(),
        })
    }

    /// Inserts `key -> value` unless an equal key is present.
    ///
    /// The duplicate check runs first. A rejected insert returns the pair in
    /// [`Insert::DuplicateKey`] without allocating or growing, even when the
    /// map sits at its load-factor threshold.
    ///
    /// For a new key, growth completes before the entry is linked. If it
    /// fails the error is returned and the map is exactly as before.
    pub fn insert(&mut self, key: K, value: V) -> Result<Insert<K, V>> {
        let _g = self.reentrancy.enter();
        let hash = self.ops.hash(&key);
        if self.find_in_chain(hash, &key).is_some() {
            return Ok(Insert::DuplicateKey { key, value });
        }

        if self.entries.len() >= ARENA_LIMIT {
            return Err(MapError::AllocationFailure);
        }
        let required = self.entries.len() + 1;
        if sizing::exceeds(required, self.slots.len(), self.max_load_factor) {
            let target = self
                .growth
                .grow_for(self.slots.len(), required, self.max_load_factor)?;
            rehash(&mut self.slots, &mut self.entries, target)?;
        }

        let index = bucket_index(hash, self.slots.len());
        let next = self.slots[index];
        let k = self.entries.insert(Entry {
            key,
            value,
            hash,
            next,
        });
        self.slots[index] = Some(k);
        Ok(Insert::Inserted(Handle(k)))
    }
}

impl<K, V, O> ChainedMap<K, V, O> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    pub fn growth_policy(&self) -> GrowthPolicy {
        self.growth
    }

    pub fn key_ops(&self) -> &O {
        &self.ops
    }

    /// `len() / slot_count()`, or zero for a map without buckets.
    #[allow(clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        if self.slots.is_empty() {
            0.0
        } else {
            self.entries.len() as f64 / self.slots.len() as f64
        }
    }

    /// Rebuilds the bucket array with `target` slots, relinking every entry
    /// by its cached hash.
    ///
    /// Shrinking is allowed as long as `target > 0`; zero is only accepted
    /// for an empty map and releases the array.
    pub fn resize(&mut self, target: usize) -> Result<Resize> {
        let _g = self.reentrancy.enter();
        if target == self.slots.len() {
            return Ok(Resize::Unchanged);
        }
        if target == 0 {
            if !self.entries.is_empty() {
                return Err(MapError::InvalidOperation(
                    "cannot resize to zero slots while entries remain",
                ));
            }
            self.slots = Vec::new();
            return Ok(Resize::Changed);
        }
        rehash(&mut self.slots, &mut self.entries, target)?;
        Ok(Resize::Changed)
    }

    /// Unlinks every entry, handing keys and values to `reclaim` in
    /// traversal order. The bucket array keeps its size.
    pub fn clear<R: Reclaim<K, V>>(&mut self, mut reclaim: R) {
        let _g = self.reentrancy.enter();
        for slot in self.slots.iter_mut() {
            while let Some(k) = *slot {
                let Some(e) = self.entries.remove(k) else {
                    break;
                };
                *slot = e.next;
                reclaim.reclaim_key(e.key);
                reclaim.reclaim_value(e.value);
            }
        }
        debug_assert!(self.entries.is_empty());
    }

    /// Destroys the map, reclaiming every entry first.
    ///
    /// Dropping the map is the same as `delete(())`.
    pub fn delete<R: Reclaim<K, V>>(mut self, reclaim: R) {
        self.clear(reclaim);
    }

    /// Visits every entry in bucket order, most recently linked first within
    /// a bucket. Values may be updated in place.
    pub fn for_each<FK, FV>(&mut self, mut key_action: FK, mut value_action: FV)
    where
        FK: FnMut(&K),
        FV: FnMut(&mut V),
    {
        let _g = self.reentrancy.enter();
        for &head in &self.slots {
            let mut cur = head;
            while let Some(k) = cur {
                let e = &mut self.entries[k];
                key_action(&e.key);
                value_action(&mut e.value);
                cur = e.next;
            }
        }
    }

    /// Entries in bucket order, most recently linked first within a bucket.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.slots.iter(),
            entries: &self.entries,
            cur: None,
            remaining: self.entries.len(),
        }
    }

    /// Mutable access to every value, in arena order rather than bucket
    /// order. Use [`ChainedMap::for_each`] when the order matters.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.entries.iter_mut(),
        }
    }

    /// Removes the entry behind `handle` and returns its key and value.
    ///
    /// `handle` must come from this map; see [`Handle`].
    pub fn remove_handle(&mut self, handle: Handle) -> Option<(K, V)> {
        let _g = self.reentrancy.enter();
        let hash = self.entries.get(handle.0)?.hash;
        let index = bucket_index(hash, self.slots.len());
        unlink_where(&mut self.slots, &mut self.entries, index, |k, _| {
            k == handle.0
        })
        .map(|e| (e.key, e.value))
    }

    fn find_in_chain<Q>(&self, hash: u64, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOps<Q>,
    {
        if self.slots.is_empty() {
            return None;
        }
        let mut cur = self.slots[bucket_index(hash, self.slots.len())];
        while let Some(k) = cur {
            let e = &self.entries[k];
            if e.hash == hash && self.ops.eq(e.key.borrow(), q) {
                return Some(k);
            }
            cur = e.next;
        }
        None
    }

    fn locate<Q>(&self, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOps<Q>,
    {
        if self.entries.is_empty() {
            return None;
        }
        self.find_in_chain(self.ops.hash(q), q)
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOps<Q>,
    {
        let _g = self.reentrancy.enter();
        self.locate(q).map(Handle)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOps<Q>,
    {
        let _g = self.reentrancy.enter();
        self.locate(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOps<Q>,
    {
        let _g = self.reentrancy.enter();
        self.locate(q).map(|k| &self.entries[k].value)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOps<Q>,
    {
        let _g = self.reentrancy.enter();
        self.locate(q).map(|k| {
            let e = &self.entries[k];
            (&e.key, &e.value)
        })
    }

    /// Mutable access to the stored value; the entry stays where it is.
    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOps<Q>,
    {
        let _g = self.reentrancy.enter();
        let k = self.locate(q)?;
        self.entries.get_mut(k).map(|e| &mut e.value)
    }

    /// Unlinks the entry equal to `q` and returns ownership of its key and
    /// value.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOps<Q>,
    {
        let _g = self.reentrancy.enter();
        if self.entries.is_empty() {
            return None;
        }
        let hash = self.ops.hash(q);
        let index = bucket_index(hash, self.slots.len());
        let ops = &self.ops;
        unlink_where(&mut self.slots, &mut self.entries, index, |_, e| {
            e.hash == hash && ops.eq(e.key.borrow(), q)
        })
        .map(|e| (e.key, e.value))
    }

    /// Removes the entry equal to `q`, passing its key and then its value to
    /// `reclaim`. Never shrinks the bucket array.
    pub fn erase<Q, R>(&mut self, q: &Q, mut reclaim: R) -> Erase
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOps<Q>,
        R: Reclaim<K, V>,
    {
        match self.remove(q) {
            Some((key, value)) => {
                reclaim.reclaim_key(key);
                reclaim.reclaim_value(value);
                Erase::Removed
            }
            None => Erase::Absent,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, O> fmt::Debug for ChainedMap<K, V, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, O> IntoIterator for &'a ChainedMap<K, V, O> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[inline]
#[allow(clippy::cast_possible_truncation)]
fn bucket_index(hash: u64, slot_count: usize) -> usize {
    debug_assert!(slot_count > 0);
    // The remainder is below `slot_count`, so it fits back into usize.
    (hash % slot_count as u64) as usize
}

/// Moves every chain of `slots` into a fresh array of `target` buckets.
/// The new array is allocated before any link changes.
///
/// Entries of one old chain that land in the same new bucket keep their
/// relative order, so a chain stays most recently inserted first.
fn rehash<K, V>(slots: &mut Slots, entries: &mut Arena<K, V>, target: usize) -> Result<()> {
    let mut fresh = sizing::alloc_slots(target)?;
    for &head in slots.iter() {
        // Reversed first: pushing onto the new heads undoes it.
        let mut reversed = None;
        let mut cur = head;
        while let Some(k) = cur {
            let e = &mut entries[k];
            cur = e.next;
            e.next = reversed;
            reversed = Some(k);
        }
        let mut cur = reversed;
        while let Some(k) = cur {
            let e = &mut entries[k];
            cur = e.next;
            let index = bucket_index(e.hash, target);
            e.next = fresh[index];
            fresh[index] = Some(k);
        }
    }
    *slots = fresh;
    Ok(())
}

/// Walks chain `index` keeping the previous link, and unlinks the first
/// entry `hit` accepts.
fn unlink_where<K, V>(
    slots: &mut [Option<DefaultKey>],
    entries: &mut Arena<K, V>,
    index: usize,
    mut hit: impl FnMut(DefaultKey, &Entry<K, V>) -> bool,
) -> Option<Entry<K, V>> {
    let mut prev = None;
    let mut cur = slots[index];
    while let Some(k) = cur {
        let e = &entries[k];
        let next = e.next;
        if hit(k, e) {
            match prev {
                Some(p) => entries[p].next = next,
                None => slots[index] = next,
            }
            return entries.remove(k);
        }
        prev = Some(k);
        cur = next;
    }
    None
}

/// Iterator over `(&K, &V)` in bucket order.
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Option<DefaultKey>>,
    entries: &'a Arena<K, V>,
    cur: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(k) = self.cur {
                let entries = self.entries;
                let e = &entries[k];
                self.cur = e.next;
                self.remaining -= 1;
                return Some((&e.key, &e.value));
            }
            self.cur = *self.slots.next()?;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in arena order.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (&e.key, &mut e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}
