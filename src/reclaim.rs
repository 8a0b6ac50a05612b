//! Reclaiming keys and values that leave the map.
//!
//! `erase`, `clear` and `delete` unlink entries and hand each key and value
//! to a [`Reclaim`] exactly once, key first. The entry is already unlinked
//! when the callback runs, so the map is consistent again by then.
//!
//! Passing `()` (or [`DropReclaim`]) simply drops both halves. Use
//! [`FnReclaim`] to supply closures, e.g. to release a resource that a
//! by-reference key only points at.

/// Consumes keys and values removed from a map.
pub trait Reclaim<K, V> {
    fn reclaim_key(&mut self, key: K) {
        drop(key);
    }

    fn reclaim_value(&mut self, value: V) {
        drop(value);
    }
}

impl<K, V> Reclaim<K, V> for () {}

/// Drops keys and values.
#[derive(Clone, Copy, Debug, Default)]
pub struct DropReclaim;

impl<K, V> Reclaim<K, V> for DropReclaim {}

/// Reclaim through a pair of closures. Pass `drop` for a half that needs no
/// special handling.
pub struct FnReclaim<FK, FV> {
    key_fn: FK,
    value_fn: FV,
}

impl<FK, FV> FnReclaim<FK, FV> {
    pub fn new(key_fn: FK, value_fn: FV) -> Self {
        Self { key_fn, value_fn }
    }
}

impl<K, V, FK, FV> Reclaim<K, V> for FnReclaim<FK, FV>
where
    FK: FnMut(K),
    FV: FnMut(V),
{
    fn reclaim_key(&mut self, key: K) {
        (self.key_fn)(key)
    }

    fn reclaim_value(&mut self, value: V) {
        (self.value_fn)(value)
    }
}

impl<K, V, R: Reclaim<K, V> + ?Sized> Reclaim<K, V> for &mut R {
    fn reclaim_key(&mut self, key: K) {
        (**self).reclaim_key(key)
    }

    fn reclaim_value(&mut self, value: V) {
        (**self).reclaim_value(value)
    }
}
