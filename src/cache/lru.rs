//! LRU Module
//!
//! Logical clock and victim selection for least-recently-used eviction.

use std::sync::atomic::{AtomicU64, Ordering};

use super::entry::Slot;

// == Logical Clock ==
/// Process-wide access counter.
///
/// Advanced exactly once per lookup attempt, hit or miss. Insertions are
/// stamped with the current value without advancing it.
#[derive(Debug, Default)]
pub(crate) struct LogicalClock {
    now: AtomicU64,
}

impl LogicalClock {
    // == Constructor ==
    /// Creates a clock starting at zero.
    pub fn new() -> Self {
        Self {
            now: AtomicU64::new(0),
        }
    }

    // == Tick ==
    /// Advances the clock and returns the new value.
    pub fn tick(&self) -> u64 {
        self.now.fetch_add(1, Ordering::AcqRel) + 1
    }

    // == Current ==
    /// Returns the current value without advancing.
    pub fn current(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }
}

// == Victim Selection ==
/// Returns the index of the least recently used slot.
///
/// Linear scan for the minimum access stamp; equal stamps resolve to the
/// earliest inserted slot. Returns None if `slots` is empty.
pub(crate) fn select_victim(slots: &[Slot]) -> Option<usize> {
    slots
        .iter()
        .enumerate()
        .min_by_key(|(_, slot)| (slot.stamp(), slot.inserted))
        .map(|(index, _)| index)
}
