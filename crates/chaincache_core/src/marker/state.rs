//! Exportable marker state.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// A closed interval of indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndexRange {
    /// First index in the range.
    pub start: u64,
    /// Last index in the range (inclusive).
    pub end: u64,
}

impl IndexRange {
    /// Creates a new range.
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Returns true if `index` lies within the range.
    pub const fn contains(&self, index: u64) -> bool {
        self.start <= index && index <= self.end
    }

    /// Number of indices in the range, saturating at `u64::MAX`.
    pub const fn len(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }

    /// Always false; a closed range holds at least one index.
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// Serializable snapshot of a `RangeMarker`.
///
/// `ranges` are the stored intervals; an index is marked iff it lies in one
/// of them XOR `inverted` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerState {
    /// Stored intervals, sorted, disjoint and non-adjacent.
    pub ranges: Vec<IndexRange>,
    /// Global inversion flag.
    #[serde(default)]
    pub inverted: bool,
}

impl MarkerState {
    /// Checks the interval invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if a range is reversed, or if
    /// ranges are unsorted, overlapping or adjacent.
    pub fn validate(&self) -> CoreResult<()> {
        for range in &self.ranges {
            if range.end < range.start {
                return Err(CoreError::invalid_argument(format!(
                    "range end {} is before start {}",
                    range.end, range.start
                )));
            }
        }
        for pair in self.ranges.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let gap_ok = prev
                .end
                .checked_add(1)
                .is_some_and(|after| next.start > after);
            if !gap_ok {
                return Err(CoreError::invalid_argument(format!(
                    "ranges [{}, {}] and [{}, {}] are unsorted, overlapping or adjacent",
                    prev.start, prev.end, next.start, next.end
                )));
            }
        }
        Ok(())
    }
}
