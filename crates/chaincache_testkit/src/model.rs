//! Reference model of the range marker.
//!
//! [`MarkerModel`] keeps one entry per touched index, which is slow but
//! obviously correct for the small domains property tests use.

use crate::generators::MarkerOp;
use chaincache_core::{MarkState, RangeMarker, Selection};
use std::collections::BTreeSet;

/// Set-of-indices model of a [`RangeMarker`].
#[derive(Debug, Clone, Default)]
pub struct MarkerModel {
    stored: BTreeSet<u64>,
    inverted: bool,
}

impl MarkerModel {
    /// Creates a model with nothing marked.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `index` is marked.
    pub fn is_marked(&self, index: u64) -> bool {
        self.stored.contains(&index) != self.inverted
    }

    /// Sets the mark of every selected index.
    pub fn set(&mut self, marked: bool, selection: &Selection) {
        for index in indices(selection) {
            if marked != self.inverted {
                self.stored.insert(index);
            } else {
                self.stored.remove(&index);
            }
        }
    }

    /// Flips the global sense.
    pub fn invert(&mut self) {
        self.inverted = !self.inverted;
    }

    /// Applies one operation.
    pub fn apply(&mut self, op: &MarkerOp) {
        match op {
            MarkerOp::Set { marked, selection } => self.set(*marked, selection),
            MarkerOp::Invert => self.invert(),
        }
    }

    /// Three-valued mark state of a non-empty selection.
    pub fn state_of(&self, selection: &Selection) -> Option<MarkState> {
        indices(selection)
            .map(|i| MarkState::from(self.is_marked(i)))
            .reduce(MarkState::combine)
    }

    /// First index in `start..=end` whose mark equals `marked`.
    pub fn first(&self, marked: bool, start: u64, end: u64) -> Option<u64> {
        (start..=end).find(|&i| self.is_marked(i) == marked)
    }
}

/// Applies one operation to a real marker.
///
/// # Panics
///
/// Panics if the marker rejects the operation.
pub fn apply_to_marker(marker: &mut RangeMarker, op: &MarkerOp) {
    match op {
        MarkerOp::Set { marked, selection } => {
            marker
                .set(*marked, selection.clone())
                .expect("generated selections are valid");
        }
        MarkerOp::Invert => {
            marker.invert();
        }
    }
}

/// Enumerates the indices of a selection.
pub fn indices(selection: &Selection) -> Box<dyn Iterator<Item = u64> + '_> {
    match selection {
        Selection::Index(i) => Box::new(std::iter::once(*i)),
        Selection::Range { start, end } => Box::new(*start..=*end),
        Selection::Set(set) => Box::new(set.iter().copied()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_set_and_invert() {
        let mut model = MarkerModel::new();
        model.set(true, &Selection::from(2..=4));
        assert!(model.is_marked(3));
        assert!(!model.is_marked(5));
        model.invert();
        assert!(!model.is_marked(3));
        assert!(model.is_marked(5));
        model.set(true, &Selection::from(3));
        assert!(model.is_marked(3));
    }

    #[test]
    fn model_state_and_first() {
        let mut model = MarkerModel::new();
        model.set(true, &Selection::from(vec![1, 2]));
        assert_eq!(model.state_of(&Selection::from(1..=2)), Some(MarkState::Marked));
        assert_eq!(model.state_of(&Selection::from(1..=3)), Some(MarkState::Mixed));
        assert_eq!(model.state_of(&Selection::Set(vec![])), None);
        assert_eq!(model.first(false, 1, 10), Some(3));
        assert_eq!(model.first(true, 3, 10), None);
    }
}
