//! Bucket array sizing: the growth policy and overflow-checked allocation.
//!
//! Every size that ends up in an allocation is computed with checked
//! arithmetic. Growth targets are fully computed (and the new array fully
//! allocated) before a map touches any of its existing links, so a failure
//! here always leaves the caller's map untouched.

use crate::error::{MapError, Result};
use core::mem::size_of;

/// Slot count used when growing a map that has no buckets at all.
pub const BOOTSTRAP_SLOTS: usize = 1024;

/// Multiplicative-plus-additive growth: `slots * numerator / denominator + step`.
///
/// The default grows by 1.75 and adds one, so even a one-slot map makes
/// progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowthPolicy {
    pub numerator: usize,
    pub denominator: usize,
    pub step: usize,
    pub bootstrap: usize,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self {
            numerator: 7,
            denominator: 4,
            step: 1,
            bootstrap: BOOTSTRAP_SLOTS,
        }
    }
}

impl GrowthPolicy {
    /// Rejects policies that could fail to grow a non-empty array.
    pub fn validate(&self) -> Result<()> {
        if self.denominator == 0 {
            return Err(MapError::InvalidParameter {
                name: "growth.denominator",
                reason: "must be non-zero",
            });
        }
        if self.numerator < self.denominator || self.step == 0 {
            return Err(MapError::InvalidParameter {
                name: "growth",
                reason: "must strictly increase the slot count",
            });
        }
        if self.bootstrap == 0 {
            return Err(MapError::InvalidParameter {
                name: "growth.bootstrap",
                reason: "must be non-zero",
            });
        }
        Ok(())
    }

    /// One growth step from `current` slots.
    pub fn next_slot_count(&self, current: usize) -> Result<usize> {
        if current == 0 {
            return Ok(self.bootstrap);
        }
        current
            .checked_mul(self.numerator)
            .map(|n| n / self.denominator)
            .and_then(|n| n.checked_add(self.step))
            .ok_or(MapError::ArithmeticOverflow)
    }

    /// Slot count to grow to from `current` so that `required` entries fit
    /// within `max_load_factor`.
    ///
    /// Policy steps are repeated up to [`MAX_GROWTH_STEPS`] times. A policy
    /// that still falls short (linear growth under a tiny load factor) jumps
    /// straight to [`min_slots_for`].
    pub fn grow_for(
        &self,
        current: usize,
        required: usize,
        max_load_factor: f64,
    ) -> Result<usize> {
        let floor = min_slots_for(required, max_load_factor)?;
        let mut target = self.next_slot_count(current)?;
        for _ in 0..MAX_GROWTH_STEPS {
            if target >= floor {
                return Ok(target);
            }
            target = self.next_slot_count(target)?;
        }
        Ok(target.max(floor))
    }
}

/// Policy steps [`GrowthPolicy::grow_for`] takes before jumping to the floor.
pub const MAX_GROWTH_STEPS: usize = 64;

/// Smallest slot count that holds `entries` within `max_load_factor`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn min_slots_for(entries: usize, max_load_factor: f64) -> Result<usize> {
    let exact = (entries as f64 / max_load_factor).ceil();
    if exact.is_nan() || exact >= usize::MAX as f64 {
        return Err(MapError::ArithmeticOverflow);
    }
    let mut slots = exact as usize;
    // Float rounding can land a few slots off the strict bound either way.
    while exceeds(entries, slots, max_load_factor) {
        slots = slots.checked_add(1).ok_or(MapError::ArithmeticOverflow)?;
    }
    while slots > 1 && !exceeds(entries, slots - 1, max_load_factor) {
        slots -= 1;
    }
    Ok(slots)
}

/// True when `entries` would not fit into `slots` under `max_load_factor`.
#[allow(clippy::cast_precision_loss)]
pub fn exceeds(entries: usize, slots: usize, max_load_factor: f64) -> bool {
    slots == 0 || entries as f64 / slots as f64 > max_load_factor
}

/// Byte size of an array of `count` elements of `T`, if it is a legal
/// allocation size.
pub fn array_bytes<T>(count: usize) -> Result<usize> {
    let bytes = count
        .checked_mul(size_of::<T>())
        .ok_or(MapError::ArithmeticOverflow)?;
    if bytes > isize::MAX as usize {
        return Err(MapError::ArithmeticOverflow);
    }
    Ok(bytes)
}

/// Allocates `count` empty buckets without aborting on allocator failure.
pub fn alloc_slots<T>(count: usize) -> Result<Vec<Option<T>>> {
    array_bytes::<Option<T>>(count)?;
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(count)
        .map_err(|_| MapError::AllocationFailure)?;
    slots.resize_with(count, || None);
    Ok(slots)
}
