//! Sparse marking of indices over an unbounded domain.
//!
//! [`RangeMarker`] records a boolean per index over `[0, u64::MAX]` using
//! memory proportional to the number of transitions between marked and
//! unmarked runs. A fully synced chain prefix of millions of heights is a
//! single stored interval, and [`RangeMarker::invert`] turns "everything
//! except these" into the same short list.

mod selection;
mod state;

pub use selection::{MarkState, Selection};
pub use state::{IndexRange, MarkerState};

use crate::error::{CoreError, CoreResult};
use std::collections::BTreeMap;
use std::ops::Bound;
use tracing::trace;

/// Tracks which indices are marked.
///
/// Internally a map from interval start to interval end holds the *stored*
/// intervals; an index is marked iff it is stored XOR `inverted`.
///
/// Invariant: stored intervals are disjoint and never adjacent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeMarker {
    ranges: BTreeMap<u64, u64>,
    inverted: bool,
}

impl RangeMarker {
    /// Creates a marker with nothing marked.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a marker from a previously exported state.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if the state breaks the
    /// interval invariants.
    pub fn from_state(state: MarkerState) -> CoreResult<Self> {
        state.validate()?;
        Ok(Self {
            ranges: state.ranges.iter().map(|r| (r.start, r.end)).collect(),
            inverted: state.inverted,
        })
    }

    /// Exports the current state.
    pub fn state(&self) -> MarkerState {
        MarkerState {
            ranges: self.ranges().collect(),
            inverted: self.inverted,
        }
    }

    /// Unmarks everything.
    pub fn reset(&mut self) -> &mut Self {
        self.ranges.clear();
        self.inverted = false;
        self
    }

    /// Iterates the stored intervals in ascending order.
    pub fn ranges(&self) -> impl Iterator<Item = IndexRange> + '_ {
        self.ranges.iter().map(|(&s, &e)| IndexRange::new(s, e))
    }

    /// Number of stored intervals.
    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    /// Returns true if the global sense is inverted.
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Marks the selected indices.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for a reversed range.
    pub fn mark(&mut self, selection: impl Into<Selection>) -> CoreResult<&mut Self> {
        self.set(true, selection)
    }

    /// Unmarks the selected indices.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for a reversed range.
    pub fn unmark(&mut self, selection: impl Into<Selection>) -> CoreResult<&mut Self> {
        self.set(false, selection)
    }

    /// Sets the mark status of the selected indices.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for a reversed range.
    pub fn set(&mut self, marked: bool, selection: impl Into<Selection>) -> CoreResult<&mut Self> {
        let selection = selection.into();
        let runs = selection.runs()?;
        let store = marked != self.inverted;
        for (start, end) in runs {
            trace!(start, end, marked, "setting index run");
            if store {
                self.insert(start, end);
            } else {
                self.remove(start, end);
            }
        }
        Ok(self)
    }

    /// Reports whether the selected indices are all marked, all unmarked,
    /// or mixed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for a reversed range or an
    /// empty index set.
    pub fn is_marked(&self, selection: impl Into<Selection>) -> CoreResult<MarkState> {
        let selection = selection.into();
        if selection.is_empty() {
            return Err(CoreError::invalid_argument("empty index set"));
        }
        let mut result: Option<MarkState> = None;
        for (start, end) in selection.runs()? {
            let state = self.stored_state(start, end);
            let state = if self.inverted { state.inverted() } else { state };
            let combined = result.map_or(state, |acc| acc.combine(state));
            if combined.is_mixed() {
                return Ok(MarkState::Mixed);
            }
            result = Some(combined);
        }
        result.ok_or_else(|| CoreError::invalid_argument("empty index set"))
    }

    /// Flips the mark status of every index in O(1).
    pub fn invert(&mut self) -> &mut Self {
        self.inverted = !self.inverted;
        self
    }

    /// Finds the smallest index in `start..=end` (or `start..` when `end` is
    /// `None`) whose mark status equals `marked`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if `end < start`.
    pub fn get_first(&self, marked: bool, start: u64, end: Option<u64>) -> CoreResult<Option<u64>> {
        if let Some(end) = end {
            Selection::range(start, end)?;
        }
        let found = if marked != self.inverted {
            self.first_stored(start)
        } else {
            self.first_unstored(start)
        };
        Ok(found.filter(|&index| end.is_none_or(|end| index <= end)))
    }

    /// Stored interval containing `index`, if any.
    fn containing(&self, index: u64) -> Option<(u64, u64)> {
        self.ranges
            .range(..=index)
            .next_back()
            .map(|(&s, &e)| (s, e))
            .filter(|&(_, e)| e >= index)
    }

    fn first_stored(&self, from: u64) -> Option<u64> {
        if self.containing(from).is_some() {
            return Some(from);
        }
        self.ranges
            .range((Bound::Excluded(from), Bound::Unbounded))
            .next()
            .map(|(&s, _)| s)
    }

    fn first_unstored(&self, from: u64) -> Option<u64> {
        match self.containing(from) {
            // Intervals are never adjacent, so the index after one is unstored.
            Some((_, end)) => end.checked_add(1),
            None => Some(from),
        }
    }

    /// Stored status of `start..=end`, ignoring inversion.
    fn stored_state(&self, start: u64, end: u64) -> MarkState {
        match self.ranges.range(..=end).next_back() {
            None => MarkState::Unmarked,
            Some((_, &e)) if e < start => MarkState::Unmarked,
            Some((&s, &e)) if s <= start && e >= end => MarkState::Marked,
            Some(_) => MarkState::Mixed,
        }
    }

    /// Stores `start..=end`, coalescing with overlapping or adjacent intervals.
    fn insert(&mut self, start: u64, end: u64) {
        let low = start.saturating_sub(1);
        let high = end.saturating_add(1);
        let touching: Vec<(u64, u64)> = self
            .ranges
            .range(..=high)
            .rev()
            .take_while(|&(_, &e)| e >= low)
            .map(|(&s, &e)| (s, e))
            .collect();

        let mut merged_start = start;
        let mut merged_end = end;
        for (s, e) in touching {
            self.ranges.remove(&s);
            merged_start = merged_start.min(s);
            merged_end = merged_end.max(e);
        }
        self.ranges.insert(merged_start, merged_end);
    }

    /// Removes `start..=end`, splitting intervals that straddle its edges.
    fn remove(&mut self, start: u64, end: u64) {
        let overlapping: Vec<(u64, u64)> = self
            .ranges
            .range(..=end)
            .rev()
            .take_while(|&(_, &e)| e >= start)
            .map(|(&s, &e)| (s, e))
            .collect();

        for (s, e) in overlapping {
            self.ranges.remove(&s);
            if s < start {
                self.ranges.insert(s, start - 1);
            }
            if e > end {
                self.ranges.insert(end + 1, e);
            }
        }
    }
}
