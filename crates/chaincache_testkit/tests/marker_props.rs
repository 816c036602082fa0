//! Property tests comparing the range marker with its reference model.

use chaincache_core::{MarkState, RangeMarker, Selection};
use chaincache_testkit::prelude::*;
use proptest::prelude::*;

fn replay(ops: &[MarkerOp]) -> (RangeMarker, MarkerModel) {
    let mut marker = RangeMarker::new();
    let mut model = MarkerModel::new();
    for op in ops {
        apply_to_marker(&mut marker, op);
        model.apply(op);
    }
    (marker, model)
}

proptest! {
    #![proptest_config(PropTestConfig::default().to_proptest_config())]

    #[test]
    fn marker_matches_model(ops in marker_ops_strategy(0, 40)) {
        let (marker, model) = replay(&ops);
        for index in 0..=RANGE_REACH + 1 {
            prop_assert_eq!(
                marker.is_marked(index).unwrap(),
                MarkState::from(model.is_marked(index)),
                "index {}", index
            );
        }
    }

    #[test]
    fn state_stays_canonical(ops in marker_ops_strategy(0, 40)) {
        let (marker, _) = replay(&ops);
        let state = marker.state();
        prop_assert!(state.validate().is_ok());
        prop_assert_eq!(state.ranges.len(), marker.range_count());
        prop_assert_eq!(RangeMarker::from_state(state).unwrap(), marker);
    }

    #[test]
    fn selection_state_matches_model(
        ops in marker_ops_strategy(0, 30),
        selection in selection_strategy(),
    ) {
        let (marker, model) = replay(&ops);
        prop_assert_eq!(
            Some(marker.is_marked(selection.clone()).unwrap()),
            model.state_of(&selection)
        );
    }

    #[test]
    fn get_first_matches_scan(
        ops in marker_ops_strategy(0, 30),
        marked in any::<bool>(),
        start in index_strategy(),
        span in 0u64..64,
    ) {
        let (marker, model) = replay(&ops);
        let end = start + span;
        prop_assert_eq!(
            marker.get_first(marked, start, Some(end)).unwrap(),
            model.first(marked, start, end)
        );
    }

    #[test]
    fn unbounded_get_first_finds_past_domain(
        ops in marker_ops_strategy(0, 30),
        marked in any::<bool>(),
        start in index_strategy(),
    ) {
        let (marker, model) = replay(&ops);
        // Past RANGE_REACH every index shares one mark, so the scan is exact.
        let beyond = model.is_marked(RANGE_REACH + 1);
        let expected = model
            .first(marked, start, RANGE_REACH)
            .or_else(|| (beyond == marked).then_some(RANGE_REACH + 1));
        prop_assert_eq!(marker.get_first(marked, start, None).unwrap(), expected);
    }

    #[test]
    fn double_invert_is_identity(ops in marker_ops_strategy(0, 30)) {
        let (mut marker, _) = replay(&ops);
        let before = marker.clone();
        marker.invert().invert();
        prop_assert_eq!(marker, before);
    }

    #[test]
    fn mark_then_unmark_clears_selection(
        ops in marker_ops_strategy(0, 30),
        selection in selection_strategy(),
    ) {
        let (mut marker, _) = replay(&ops);
        marker.mark(selection.clone()).unwrap();
        prop_assert_eq!(marker.is_marked(selection.clone()).unwrap(), MarkState::Marked);
        marker.unmark(selection.clone()).unwrap();
        prop_assert_eq!(marker.is_marked(selection).unwrap(), MarkState::Unmarked);
    }
}

#[test]
fn empty_set_selection_is_a_no_op() {
    let mut marker = RangeMarker::new();
    marker.mark(5).unwrap();
    let before = marker.clone();
    marker.mark(Selection::Set(Vec::new())).unwrap();
    assert_eq!(marker, before);
}
