//! In-memory block cache.
//!
//! [`BlockCache`] is the single owner of canonical blocks for one chain. It
//! merges every fetched block into the cached block at the same height,
//! indexes transactions by id, and tracks the heights whose blocks are
//! complete in a [`RangeMarker`]. All state sits behind one lock, so
//! concurrent ingests of overlapping data are serialized.

use crate::error::{CoreError, CoreResult};
use crate::marker::{MarkState, RangeMarker, Selection};
use crate::model::{Block, BlockHandle, Transaction};
use parking_lot::RwLock;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

#[derive(Default)]
struct CacheState {
    blocks: BTreeMap<u64, Block>,
    tx_heights: HashMap<String, u64>,
    handles: HashMap<BlockHandle, u64>,
    complete: RangeMarker,
}

/// Canonical blocks by height, with a completeness marker.
///
/// # Example
///
/// ```rust
/// use chaincache_core::{Block, BlockCache, Header, Transaction};
///
/// let cache = BlockCache::new();
/// let partial = Block::new()
///     .with_header(Header::new().with_height(7))
///     .with_tx_ids(["t1"]);
/// assert!(!cache.ingest(partial).unwrap());
///
/// let rest = Block::new()
///     .with_header(Header::new().with_height(7))
///     .with_txs(vec![Transaction::with_id("t1")]);
/// assert!(cache.ingest(rest).unwrap());
/// assert_eq!(cache.next_missing(7, None).unwrap(), Some(8));
/// ```
#[derive(Default)]
pub struct BlockCache {
    state: RwLock<CacheState>,
}

impl BlockCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `block` into the cached block at its height.
    ///
    /// Returns true if the cached block is complete afterwards, in which
    /// case its height is marked as cached.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if the block has no height, or
    /// a merge error if it disagrees with the cached block. A failed ingest
    /// changes nothing.
    pub fn ingest(&self, block: Block) -> CoreResult<bool> {
        let height = block
            .height()
            .ok_or_else(|| CoreError::invalid_argument("cannot cache a block without a height"))?;

        let mut state = self.state.write();
        let CacheState {
            blocks,
            tx_heights,
            handles,
            complete,
        } = &mut *state;

        let cached = match blocks.entry(height) {
            Entry::Occupied(entry) => {
                let cached = entry.into_mut();
                cached
                    .merge(&block)
                    .inspect_err(|e| warn!(height, error = %e, "rejected conflicting block"))?;
                cached
            }
            Entry::Vacant(entry) => {
                debug!(height, "caching new block");
                entry.insert(block)
            }
        };

        handles.insert(cached.handle(), height);
        for id in cached.transactions().filter_map(|tx| tx.id.clone()) {
            tx_heights.insert(id, height);
        }

        let is_complete = cached.is_complete();
        if is_complete {
            complete.mark(height)?;
        }
        Ok(is_complete)
    }

    /// Returns a snapshot of the cached block at `height`.
    pub fn block(&self, height: u64) -> Option<Block> {
        self.state.read().blocks.get(&height).cloned()
    }

    /// Returns a snapshot of the cached transaction with `id`.
    pub fn transaction(&self, id: &str) -> Option<Transaction> {
        let state = self.state.read();
        let height = state.tx_heights.get(id)?;
        state.blocks.get(height)?.transaction(id).cloned()
    }

    /// Follows a transaction's back-reference to its cached block.
    pub fn block_of(&self, tx: &Transaction) -> Option<Block> {
        let state = self.state.read();
        let height = state.handles.get(&tx.block()?)?;
        state.blocks.get(height).cloned()
    }

    /// Reports whether the selected heights hold complete blocks.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for a reversed range or an
    /// empty set.
    pub fn is_cached(&self, selection: impl Into<Selection>) -> CoreResult<MarkState> {
        self.state.read().complete.is_marked(selection)
    }

    /// First height at or after `start` (and not after `end`) without a
    /// complete cached block.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if `end < start`.
    pub fn next_missing(&self, start: u64, end: Option<u64>) -> CoreResult<Option<u64>> {
        self.state.read().complete.get_first(false, start, end)
    }

    /// Number of cached heights, complete or not.
    pub fn len(&self) -> usize {
        self.state.read().blocks.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.state.read().blocks.is_empty()
    }

    /// Snapshot of the completeness marker.
    pub fn marker(&self) -> RangeMarker {
        self.state.read().complete.clone()
    }
}
