//! Debug-only guard against callbacks re-entering a map.
//!
//! Hash, equality, reclaim and traversal callbacks run while a map's chains
//! may be mid-update. Safe code cannot reach the map from inside them (the
//! map is borrowed for the whole call), but code holding a raw pointer can.
//! In debug builds every public operation marks the map busy for its
//! duration and a nested operation panics; in release builds the guard is a
//! zero-sized no-op.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug, Default)]
pub struct DebugReentrancy {
    #[cfg(debug_assertions)]
    busy: Cell<bool>,
    // Single-threaded map: keep the owner !Send + !Sync.
    _local: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            busy: Cell::new(false),
            _local: PhantomData,
        }
    }

    /// Marks the owner busy until the returned section is dropped.
    ///
    /// # Panics
    /// In debug builds, if the owner is already busy.
    #[inline]
    pub fn enter(&self) -> Section<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.busy.replace(true),
                "map re-entered from one of its own callbacks"
            );
            Section { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            Section { _owner: PhantomData }
        }
    }
}

/// A busy section of a map operation.
pub struct Section<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a ()>,
}

impl Drop for Section<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.busy.set(false);
    }
}
