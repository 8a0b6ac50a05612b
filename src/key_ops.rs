//! Hashing and equality supplied from outside the map.
//!
//! The map never calls `Hash`/`Eq` on keys directly; every hash and every
//! key comparison goes through a [`KeyOps`] value owned by the map. Two
//! implementations ship with the crate:
//!
//! - [`StdKeyOps`] adapts `K: Hash + Eq` with a `BuildHasher` (hashbrown's
//!   default hash builder unless another is given).
//! - [`FnKeyOps`] wraps a pair of plain functions or closures.
//!
//! `hash` must be deterministic for the life of the map and must agree with
//! `eq`: keys that compare equal must produce equal hashes.

use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// Hash and equality for keys of type `Q`.
///
/// A map storing `K` is parameterised by `O: KeyOps<K>`. Lookups with a
/// borrowed form `Q` of the key additionally need `O: KeyOps<Q>`, and the
/// hash of a `Q` must equal the hash of the `K` it was borrowed from.
pub trait KeyOps<Q: ?Sized> {
    /// Full, unreduced hash of `key`.
    fn hash(&self, key: &Q) -> u64;

    /// Authoritative comparison, only consulted after the hashes matched.
    fn eq(&self, a: &Q, b: &Q) -> bool;
}

/// `Hash + Eq` keys hashed through a `BuildHasher`.
#[derive(Clone, Debug, Default)]
pub struct StdKeyOps<S = DefaultHashBuilder> {
    hasher: S,
}

impl StdKeyOps {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> StdKeyOps<S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self { hasher }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }
}

impl<Q, S> KeyOps<Q> for StdKeyOps<S>
where
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &Q) -> u64 {
        self.hasher.hash_one(key)
    }

    #[inline]
    fn eq(&self, a: &Q, b: &Q) -> bool {
        a == b
    }
}

/// Hash and equality given as two functions.
#[derive(Clone, Copy)]
pub struct FnKeyOps<H, E> {
    hash_fn: H,
    eq_fn: E,
}

impl<H, E> FnKeyOps<H, E> {
    pub fn new(hash_fn: H, eq_fn: E) -> Self {
        Self { hash_fn, eq_fn }
    }
}

impl<H, E> core::fmt::Debug for FnKeyOps<H, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("FnKeyOps")
    }
}

impl<K, H, E> KeyOps<K> for FnKeyOps<H, E>
where
    K: ?Sized,
    H: Fn(&K) -> u64,
    E: Fn(&K, &K) -> bool,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        (self.hash_fn)(key)
    }

    #[inline]
    fn eq(&self, a: &K, b: &K) -> bool {
        (self.eq_fn)(a, b)
    }
}
