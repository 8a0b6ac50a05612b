//! Builder-style configuration for [`ChainedMap`].

use crate::chained_map::{ChainedMap, DEFAULT_MAX_LOAD_FACTOR};
use crate::error::{MapError, Result};
use crate::key_ops::{FnKeyOps, KeyOps, StdKeyOps};
use crate::sizing::GrowthPolicy;

/// Collects map parameters; nothing is validated or allocated until
/// [`MapBuilder::build`].
///
/// ```
/// use chained_map::{MapBuilder, StdKeyOps};
///
/// let map = MapBuilder::new()
///     .key_ops(StdKeyOps::new())
///     .initial_slots(64)
///     .max_load_factor(0.5)
///     .build::<String, f64>()
///     .unwrap();
/// assert_eq!(map.slot_count(), 64);
/// ```
#[derive(Clone, Debug)]
pub struct MapBuilder<O = StdKeyOps> {
    ops: Option<O>,
    initial_slots: usize,
    max_load_factor: f64,
    growth: GrowthPolicy,
}

impl MapBuilder {
    pub fn new() -> Self {
        Self {
            ops: None,
            initial_slots: 0,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            growth: GrowthPolicy::default(),
        }
    }
}

impl Default for MapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> MapBuilder<O> {
    pub fn key_ops<P>(self, ops: P) -> MapBuilder<P> {
        MapBuilder {
            ops: Some(ops),
            initial_slots: self.initial_slots,
            max_load_factor: self.max_load_factor,
            growth: self.growth,
        }
    }

    pub fn hash_fns<H, E>(self, hash_fn: H, eq_fn: E) -> MapBuilder<FnKeyOps<H, E>> {
        self.key_ops(FnKeyOps::new(hash_fn, eq_fn))
    }

    pub fn initial_slots(mut self, slots: usize) -> Self {
        self.initial_slots = slots;
        self
    }

    pub fn max_load_factor(mut self, max_load_factor: f64) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    pub fn growth(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    /// Validates the collected parameters and allocates the bucket array.
    pub fn build<K, V>(self) -> Result<ChainedMap<K, V, O>>
    where
        O: KeyOps<K>,
    {
        let ops = self.ops.ok_or(MapError::NullArgument("key_ops"))?;
        ChainedMap::with_config(ops, self.initial_slots, self.max_load_factor, self.growth)
    }
}

/// Accepts only load factors in `(0, 1]`; NaN is rejected too.
pub fn check_max_load_factor(max_load_factor: f64) -> Result<()> {
    if max_load_factor > 0.0 && max_load_factor <= 1.0 {
        Ok(())
    } else {
        Err(MapError::InvalidParameter {
            name: "max_load_factor",
            reason: "must be in (0, 1]",
        })
    }
}
