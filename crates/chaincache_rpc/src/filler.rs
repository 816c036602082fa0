//! Filling a block cache from a daemon.

use crate::daemon::DaemonClient;
use crate::error::RpcResult;
use crate::http::HttpClient;
use chaincache_core::BlockCache;
use tracing::{debug, info};

/// Counters from one fill pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillStats {
    /// Blocks fetched from the daemon.
    pub blocks_fetched: u64,
    /// Transactions fetched from the daemon.
    pub txs_fetched: u64,
    /// Heights that became complete.
    pub completed: u64,
    /// True if the pass stopped early at the daemon's chain tip.
    pub reached_tip: bool,
}

/// Walks a height range and caches every block not yet complete.
pub struct CacheFiller<'a, C: HttpClient> {
    daemon: &'a DaemonClient<C>,
    cache: &'a BlockCache,
}

impl<'a, C: HttpClient> CacheFiller<'a, C> {
    /// Creates a filler feeding `cache` from `daemon`.
    pub fn new(daemon: &'a DaemonClient<C>, cache: &'a BlockCache) -> Self {
        Self { daemon, cache }
    }

    /// Fetches and ingests every height in `start..=end` that the cache
    /// does not hold complete.
    ///
    /// Heights past the daemon's tip end the pass without error. An empty
    /// range (`end < start`) does nothing.
    ///
    /// # Errors
    ///
    /// Returns the first RPC or merge error; heights ingested before it
    /// stay cached.
    pub fn fill(&self, start: u64, end: u64) -> RpcResult<FillStats> {
        let mut stats = FillStats::default();
        let mut cursor = start;

        while cursor <= end {
            let Some(height) = self.cache.next_missing(cursor, Some(end))? else {
                break;
            };
            let mut block = match self.daemon.get_block_by_height(height) {
                Ok(block) => block,
                Err(err) if err.is_not_found() => {
                    info!(height, "reached chain tip");
                    stats.reached_tip = true;
                    break;
                }
                Err(err) => return Err(err),
            };
            stats.blocks_fetched += 1;

            let ids = block.tx_ids().map(<[String]>::to_vec).unwrap_or_default();
            let txs = self.daemon.get_transactions(&ids)?;
            stats.txs_fetched += txs.len() as u64;
            block.set_txs(Some(txs));

            if self.cache.ingest(block)? {
                stats.completed += 1;
            } else {
                debug!(height, "block still incomplete");
            }

            match height.checked_add(1) {
                Some(next) => cursor = next,
                None => break,
            }
        }

        info!(
            start,
            end,
            blocks = stats.blocks_fetched,
            txs = stats.txs_fetched,
            completed = stats.completed,
            "fill pass finished"
        );
        Ok(stats)
    }
}
