//! Index selections and three-valued mark results.

use crate::error::{CoreError, CoreResult};
use std::ops::RangeInclusive;

/// The indices an operation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A single index.
    Index(u64),
    /// A closed range `start..=end`.
    Range {
        /// First index of the range.
        start: u64,
        /// Last index of the range (inclusive).
        end: u64,
    },
    /// An explicit set of indices, in any order, duplicates allowed.
    Set(Vec<u64>),
}

impl Selection {
    /// Creates a closed range selection.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if `end < start`.
    pub fn range(start: u64, end: u64) -> CoreResult<Self> {
        let selection = Self::Range { start, end };
        selection.validate()?;
        Ok(selection)
    }

    /// Checks that a range selection is not reversed.
    pub fn validate(&self) -> CoreResult<()> {
        match self {
            Self::Range { start, end } if end < start => Err(CoreError::invalid_argument(
                format!("end {end} is before start {start}"),
            )),
            _ => Ok(()),
        }
    }

    /// Returns true if the selection contains no index.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Set(indices) if indices.is_empty())
    }

    /// Decomposes the selection into sorted, disjoint, non-adjacent runs.
    pub(crate) fn runs(&self) -> CoreResult<Vec<(u64, u64)>> {
        self.validate()?;
        Ok(match self {
            Self::Index(index) => vec![(*index, *index)],
            Self::Range { start, end } => vec![(*start, *end)],
            Self::Set(indices) => {
                let mut sorted = indices.clone();
                sorted.sort_unstable();
                sorted.dedup();

                let mut runs: Vec<(u64, u64)> = Vec::new();
                for index in sorted {
                    match runs.last_mut() {
                        Some((_, end)) if end.checked_add(1) == Some(index) => *end = index,
                        _ => runs.push((index, index)),
                    }
                }
                runs
            }
        })
    }
}

impl From<u64> for Selection {
    fn from(index: u64) -> Self {
        Self::Index(index)
    }
}

impl From<RangeInclusive<u64>> for Selection {
    fn from(range: RangeInclusive<u64>) -> Self {
        let (start, end) = range.into_inner();
        Self::Range { start, end }
    }
}

impl From<Vec<u64>> for Selection {
    fn from(indices: Vec<u64>) -> Self {
        Self::Set(indices)
    }
}

impl From<&[u64]> for Selection {
    fn from(indices: &[u64]) -> Self {
        Self::Set(indices.to_vec())
    }
}

impl<const N: usize> From<[u64; N]> for Selection {
    fn from(indices: [u64; N]) -> Self {
        Self::Set(indices.to_vec())
    }
}

/// Mark status of one or more indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkState {
    /// Every queried index is marked.
    Marked,
    /// No queried index is marked.
    Unmarked,
    /// Some queried indices are marked and some are not.
    Mixed,
}

impl MarkState {
    /// Returns `Some(bool)` for a uniform result, `None` when mixed.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Marked => Some(true),
            Self::Unmarked => Some(false),
            Self::Mixed => None,
        }
    }

    /// Returns true if every queried index is marked.
    pub fn is_marked(self) -> bool {
        self == Self::Marked
    }

    /// Returns true if no queried index is marked.
    pub fn is_unmarked(self) -> bool {
        self == Self::Unmarked
    }

    /// Returns true if the queried indices disagree.
    pub fn is_mixed(self) -> bool {
        self == Self::Mixed
    }

    /// Swaps marked and unmarked; mixed stays mixed.
    #[must_use]
    pub fn inverted(self) -> Self {
        match self {
            Self::Marked => Self::Unmarked,
            Self::Unmarked => Self::Marked,
            Self::Mixed => Self::Mixed,
        }
    }

    /// Combines the results of two disjoint queries.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        if self == other {
            self
        } else {
            Self::Mixed
        }
    }
}

impl From<bool> for MarkState {
    fn from(marked: bool) -> Self {
        if marked {
            Self::Marked
        } else {
            Self::Unmarked
        }
    }
}

impl TryFrom<MarkState> for bool {
    type Error = CoreError;

    fn try_from(state: MarkState) -> CoreResult<Self> {
        state
            .as_bool()
            .ok_or_else(|| CoreError::invalid_argument("mixed mark state has no boolean value"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(Selection::from(4), Selection::Index(4));
        assert_eq!(Selection::from(2..=9), Selection::Range { start: 2, end: 9 });
        assert_eq!(Selection::from([3, 1]), Selection::Set(vec![3, 1]));
        assert_eq!(Selection::from(&[5u64][..]), Selection::Set(vec![5]));
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert!(matches!(
            Selection::range(10, 9),
            Err(CoreError::InvalidArgument { .. })
        ));
        #[allow(clippy::reversed_empty_ranges)]
        let reversed = Selection::from(10..=9);
        assert!(reversed.runs().is_err());
    }

    #[test]
    fn set_runs_are_coalesced() {
        let runs = Selection::from(vec![7, 2, 3, 4, 9, 3, u64::MAX]).runs().unwrap();
        assert_eq!(runs, vec![(2, 4), (7, 7), (9, 9), (u64::MAX, u64::MAX)]);
        assert!(Selection::Set(vec![]).runs().unwrap().is_empty());
        assert!(Selection::Set(vec![]).is_empty());
    }

    #[test]
    fn mark_state_algebra() {
        assert_eq!(MarkState::Marked.combine(MarkState::Marked), MarkState::Marked);
        assert_eq!(MarkState::Marked.combine(MarkState::Unmarked), MarkState::Mixed);
        assert_eq!(MarkState::Mixed.inverted(), MarkState::Mixed);
        assert_eq!(MarkState::Unmarked.inverted(), MarkState::Marked);
        assert_eq!(MarkState::from(true), MarkState::Marked);
    }

    #[test]
    fn mixed_cannot_be_forced_into_bool() {
        assert_eq!(bool::try_from(MarkState::Marked), Ok(true));
        assert_eq!(bool::try_from(MarkState::Unmarked), Ok(false));
        assert!(matches!(
            bool::try_from(MarkState::Mixed),
            Err(CoreError::InvalidArgument { .. })
        ));
    }
}
