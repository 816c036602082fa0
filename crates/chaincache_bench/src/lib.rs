//! Benchmark utilities.

use chaincache_core::{Block, RangeMarker, Selection};
use chaincache_testkit::{sample_block, sample_tx, tx_id};

/// A marker holding `runs` separate intervals of `width` indices each.
///
/// `width` must be at least one.
pub fn fragmented_marker(runs: u64, width: u64) -> RangeMarker {
    let mut marker = RangeMarker::new();
    for i in 0..runs {
        let start = i * (width + 1);
        // Never reversed: width is at least one.
        let _ = marker.mark(Selection::Range {
            start,
            end: start + width - 1,
        });
    }
    marker
}

/// Two halves of a block with `tx_count` transactions: one holds the
/// header and ids, the other the transaction bodies.
pub fn split_block(height: u64, tx_count: usize) -> (Block, Block) {
    let full = sample_block(height, tx_count);
    let shell = Block::new()
        .with_header(full.header().cloned().unwrap_or_default())
        .with_tx_ids(full.tx_ids().map(<[String]>::to_vec).unwrap_or_default());
    let bodies = Block::new().with_txs((0..tx_count).map(|i| sample_tx(&tx_id(height, i))).collect());
    (shell, bodies)
}
