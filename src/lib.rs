//! chained-map: a single-threaded, separately chained hash map with
//! caller-supplied hashing and equality, cached hashes and explicit
//! rehashing.
//!
//! ```
//! use chained_map::{ChainedMap, Erase, Insert};
//!
//! let mut map = ChainedMap::with_fns(
//!     |k: &String| k.bytes().map(u64::from).sum(),
//!     |a: &String, b: &String| a == b,
//!     10,
//!     0.5,
//! )
//! .unwrap();
//!
//! assert!(map.insert("War".to_string(), 1.1).unwrap().is_inserted());
//! assert!(matches!(
//!     map.insert("War".to_string(), 9.9).unwrap(),
//!     Insert::DuplicateKey { .. }
//! ));
//! *map.get_mut(&"War".to_string()).unwrap() += 1.0;
//! assert_eq!(map.erase(&"War".to_string(), ()), Erase::Removed);
//! assert!(map.is_empty());
//! ```
//!
//! Internal Design:
//!
//! Summary
//! - Entries live in a generational arena (`slotmap::SlotMap`). The bucket
//!   array holds the arena key of each chain's head and every entry holds
//!   the arena key of the next entry in its chain.
//! - Each entry stores the full `u64` hash computed at insertion. Bucket
//!   selection is `hash % slot_count`; comparisons check the cached hash
//!   before calling the user's equality function.
//! - Rehashing walks the old chains and relinks arena keys into a freshly
//!   allocated array. Entries never move, so [`Handle`]s stay valid across
//!   growth and explicit resizes, and user hash functions are never called
//!   again after insertion.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` through the reentrancy guard's marker.
//! - After every successful insert `len / slot_count <= max_load_factor`.
//!   Erase never shrinks; only [`ChainedMap::resize`] does.
//! - Duplicate inserts are rejected and hand the pair back
//!   ([`Insert::DuplicateKey`]); the stored value is untouched.
//! - Bucket array sizes are overflow-checked and allocated with
//!   `try_reserve_exact`, so oversize requests surface as
//!   [`MapError::ArithmeticOverflow`] or [`MapError::AllocationFailure`].
//!   Growth allocates the whole new array before relinking anything: a
//!   failed insert leaves the map as it was.
//!
//! Ownership
//! - Keys and values are owned by the map. Storing references (`&'a str`)
//!   or other handle types gives by-reference storage; that choice is made
//!   by the key and value types, not at runtime.
//! - Removal paths either return `(K, V)` ([`ChainedMap::remove`]) or hand
//!   them to a [`Reclaim`] ([`ChainedMap::erase`], [`ChainedMap::clear`],
//!   [`ChainedMap::delete`]), key first, after the entry is unlinked.
//!
//! Reentrancy policy
//! - Public operations enter a debug-only guard. A hash, equality, reclaim
//!   or traversal callback that reaches back into the same map (only
//!   possible through raw pointers) panics in debug builds.

pub mod chained_map;
mod chained_map_proptest;
pub mod config;
pub mod error;
pub mod key_ops;
pub mod reclaim;
mod reentrancy;
pub mod sizing;

// Public surface
pub use chained_map::{ChainedMap, Erase, Handle, Insert, Iter, IterMut, Resize};
pub use config::MapBuilder;
pub use error::{MapError, Result};
pub use key_ops::{FnKeyOps, KeyOps, StdKeyOps};
pub use reclaim::{DropReclaim, FnReclaim, Reclaim};
pub use sizing::GrowthPolicy;
