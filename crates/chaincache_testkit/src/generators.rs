//! Property-based test generators using proptest.
//!
//! Marker strategies stay inside a small index domain so results can be
//! checked against [`MarkerModel`](crate::model::MarkerModel). Entity
//! strategies produce *views*: partial projections of one consistent truth,
//! so any two views merge without conflict.

use chaincache_core::{Block, Header, Selection, Transaction};
use proptest::prelude::*;

/// Largest index produced by the marker strategies.
pub const DOMAIN_MAX: u64 = 255;

/// Largest index a generated range can reach.
pub const RANGE_REACH: u64 = DOMAIN_MAX + 32;

/// Strategy for generating indices in the test domain.
pub fn index_strategy() -> impl Strategy<Value = u64> {
    0..=DOMAIN_MAX
}

/// Strategy for generating non-empty selections.
pub fn selection_strategy() -> impl Strategy<Value = Selection> {
    prop_oneof![
        2 => index_strategy().prop_map(Selection::Index),
        3 => (index_strategy(), 0u64..32)
            .prop_map(|(start, len)| Selection::Range { start, end: start + len }),
        2 => prop::collection::vec(index_strategy(), 1..12).prop_map(Selection::Set),
    ]
}

/// A marker mutation.
#[derive(Debug, Clone)]
pub enum MarkerOp {
    /// Mark or unmark a selection.
    Set {
        /// Target mark.
        marked: bool,
        /// Indices affected.
        selection: Selection,
    },
    /// Flip the global sense.
    Invert,
}

/// Strategy for generating marker operations.
pub fn marker_op_strategy() -> impl Strategy<Value = MarkerOp> {
    prop_oneof![
        6 => (any::<bool>(), selection_strategy())
            .prop_map(|(marked, selection)| MarkerOp::Set { marked, selection }),
        1 => Just(MarkerOp::Invert),
    ]
}

/// Strategy for generating a sequence of marker operations.
pub fn marker_ops_strategy(min_ops: usize, max_ops: usize) -> impl Strategy<Value = Vec<MarkerOp>> {
    prop::collection::vec(marker_op_strategy(), min_ops..max_ops)
}

fn hex_strategy(len: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(any::<u8>(), len).prop_map(|bytes| {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    })
}

/// Strategy for generating a header with every field known.
pub fn full_header_strategy() -> impl Strategy<Value = Header> {
    (
        0u64..3_000_000,
        hex_strategy(32),
        hex_strategy(32),
        (any::<u32>(), any::<u32>(), any::<u32>()),
        (1u64..400_000, 0u64..1000, 1u64..17, 0u64..40),
    )
        .prop_map(|(height, id, prev_id, (timestamp, difficulty, nonce), (size, depth, version, num_txs))| {
            let mut header = Header::new().with_height(height).with_id(id);
            header.prev_id = Some(prev_id);
            header.timestamp = Some(u64::from(timestamp));
            header.difficulty = Some(u64::from(difficulty));
            header.nonce = Some(u64::from(nonce));
            header.size = Some(size);
            header.weight = Some(size);
            header.long_term_weight = Some(size);
            header.depth = Some(depth);
            header.major_version = Some(version);
            header.minor_version = Some(version);
            header.num_txs = Some(num_txs);
            header.orphan_status = Some(false);
            header.reward = Some(600_000_000_000);
            header
        })
}

/// Keeps the header fields whose bit is set in `mask`.
pub fn project_header(header: &Header, mask: u32) -> Header {
    let keep = |bit: u32| mask & (1 << bit) != 0;
    Header {
        height: header.height.filter(|_| keep(0)),
        id: header.id.clone().filter(|_| keep(1)),
        timestamp: header.timestamp.filter(|_| keep(2)),
        difficulty: header.difficulty.filter(|_| keep(3)),
        nonce: header.nonce.filter(|_| keep(4)),
        size: header.size.filter(|_| keep(5)),
        reward: header.reward.filter(|_| keep(6)),
        depth: header.depth.filter(|_| keep(7)),
        major_version: header.major_version.filter(|_| keep(8)),
        minor_version: header.minor_version.filter(|_| keep(9)),
        prev_id: header.prev_id.clone().filter(|_| keep(10)),
        num_txs: header.num_txs.filter(|_| keep(11)),
        orphan_status: header.orphan_status.filter(|_| keep(12)),
        weight: header.weight.filter(|_| keep(13)),
        long_term_weight: header.long_term_weight.filter(|_| keep(14)),
        pow_hash: header.pow_hash.clone().filter(|_| keep(15)),
        miner_tx_id: header.miner_tx_id.clone().filter(|_| keep(16)),
    }
}

/// Strategy for generating two partial views of one header.
pub fn header_views_strategy() -> impl Strategy<Value = (Header, Header)> {
    (full_header_strategy(), any::<u32>(), any::<u32>())
        .prop_map(|(truth, a, b)| (project_header(&truth, a), project_header(&truth, b)))
}

/// Strategy for generating a transaction with every scalar field known.
pub fn full_tx_strategy(id: String) -> impl Strategy<Value = Transaction> {
    (
        1u64..100_000_000,
        1u64..200_000,
        0u64..1000,
        hex_strategy(8),
        prop::collection::vec(0u64..10_000_000, 1..4),
    )
        .prop_map(move |(fee, size, unlock_time, extra, output_indices)| {
            let mut tx = Transaction::with_id(id.clone());
            tx.version = Some(2);
            tx.fee = Some(fee);
            tx.size = Some(size);
            tx.weight = Some(size);
            tx.unlock_time = Some(unlock_time);
            tx.extra = Some(extra);
            tx.is_coinbase = Some(false);
            tx.output_indices = Some(output_indices);
            tx
        })
}

/// Keeps the id (if any) plus the transaction fields whose bit is set in
/// `mask`.
///
/// List fields are kept as a prefix so two projections stay consistent.
pub fn project_tx(tx: &Transaction, mask: u32) -> Transaction {
    let keep = |bit: u32| mask & (1 << bit) != 0;
    let mut out = Transaction::new();
    out.id = tx.id.clone();
    out.version = tx.version.filter(|_| keep(0));
    out.fee = tx.fee.filter(|_| keep(1));
    out.size = tx.size.filter(|_| keep(2));
    out.weight = tx.weight.filter(|_| keep(3));
    out.unlock_time = tx.unlock_time.filter(|_| keep(4));
    out.extra = tx.extra.clone().filter(|_| keep(5));
    out.is_coinbase = tx.is_coinbase.filter(|_| keep(6));
    out.output_indices = tx.output_indices.as_ref().filter(|_| keep(7)).map(|indices| {
        let len = (mask as usize >> 8) % indices.len() + 1;
        indices[..len].to_vec()
    });
    out
}

/// The consistent truth behind a pair of block views.
#[derive(Debug, Clone)]
pub struct BlockTruth {
    /// Fully known header.
    pub header: Header,
    /// Fully known transactions.
    pub txs: Vec<Transaction>,
}

/// Strategy for generating block truths with up to `max_txs` transactions.
///
/// The last transaction has no id about half of the time. At most one
/// transaction is id-less, so views of the truth never conflict.
pub fn block_truth_strategy(max_txs: usize) -> impl Strategy<Value = BlockTruth> {
    (full_header_strategy(), 0..=max_txs, any::<bool>()).prop_flat_map(|(header, n, anonymous)| {
        let height = header.height.unwrap_or_default();
        let txs: Vec<_> = (0..n)
            .map(|i| full_tx_strategy(format!("{height:x}-{i}")))
            .collect();
        (Just(header), txs).prop_map(move |(header, mut txs)| {
            if anonymous {
                if let Some(last) = txs.last_mut() {
                    last.id = None;
                }
            }
            BlockTruth { header, txs }
        })
    })
}

/// Which parts of the truth a block view carries.
#[derive(Debug, Clone)]
pub struct ViewMask {
    /// Header projection mask, or `None` for a header holding only the height.
    pub header: Option<u32>,
    /// Per-transaction projection mask, or `None` to omit the transaction.
    pub txs: Vec<Option<u32>>,
    /// Whether the view lists transaction ids.
    pub with_ids: bool,
}

/// Strategy for generating view masks over `tx_count` transactions.
pub fn view_mask_strategy(tx_count: usize) -> impl Strategy<Value = ViewMask> {
    (
        prop::option::of(any::<u32>()),
        prop::collection::vec(prop::option::of(any::<u32>()), tx_count),
        any::<bool>(),
    )
        .prop_map(|(header, txs, with_ids)| ViewMask {
            header,
            txs,
            with_ids,
        })
}

impl BlockTruth {
    /// Builds the partial block described by `mask`.
    ///
    /// The view always keeps the height so it can be cached.
    pub fn view(&self, mask: &ViewMask) -> Block {
        let bits = mask.header.unwrap_or(0) | 1;
        let mut block = Block::new().with_header(project_header(&self.header, bits));
        let txs: Vec<_> = self
            .txs
            .iter()
            .zip(&mask.txs)
            .filter_map(|(tx, bits)| bits.map(|bits| project_tx(tx, bits)))
            .collect();
        if !txs.is_empty() {
            block.set_txs(Some(txs));
        }
        if mask.with_ids {
            block.set_tx_ids(Some(self.txs.iter().filter_map(|tx| tx.id.clone()).collect()));
        }
        block
    }
}

/// Strategy for generating a truth and two views of it.
pub fn block_views_strategy(max_txs: usize) -> impl Strategy<Value = (BlockTruth, Block, Block)> {
    block_truth_strategy(max_txs).prop_flat_map(|truth| {
        let n = truth.txs.len();
        (Just(truth), view_mask_strategy(n), view_mask_strategy(n))
            .prop_map(|(truth, a, b)| {
                let (va, vb) = (truth.view(&a), truth.view(&b));
                (truth, va, vb)
            })
    })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn selections_are_valid(selection in selection_strategy()) {
            prop_assert!(selection.validate().is_ok());
            prop_assert!(!selection.is_empty());
        }

        #[test]
        fn header_views_agree((a, b) in header_views_strategy()) {
            let mut merged = a.clone();
            prop_assert!(merged.merge(&b).is_ok());
        }

        #[test]
        fn views_keep_height((truth, a, b) in block_views_strategy(4)) {
            prop_assert_eq!(a.height(), truth.header.height);
            prop_assert_eq!(b.height(), truth.header.height);
        }

        #[test]
        fn at_most_one_tx_lacks_an_id(truth in block_truth_strategy(5)) {
            let anonymous = truth.txs.iter().filter(|tx| tx.id.is_none()).count();
            prop_assert!(anonymous <= 1);
            prop_assert!(truth.txs.iter().rev().skip(1).all(|tx| tx.id.is_some()));
        }
    }
}
