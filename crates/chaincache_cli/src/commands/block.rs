//! Block command implementation.

use super::Format;
use chaincache_core::{Block, ToRecord};
use chaincache_rpc::{DaemonClient, HttpClient, RpcResult};

/// Fetches the block at `height` and the bodies of its transactions.
pub fn fetch<C: HttpClient>(daemon: &DaemonClient<C>, height: u64) -> RpcResult<Block> {
    let mut block = daemon.get_block_by_height(height)?;
    let ids = block.tx_ids().map(<[String]>::to_vec).unwrap_or_default();
    let txs = daemon.get_transactions(&ids)?;
    block.merge(&Block::new().with_txs(txs))?;
    Ok(block)
}

/// Runs the block command.
pub fn run<C: HttpClient>(
    daemon: &DaemonClient<C>,
    height: u64,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = Format::parse(format)?;
    let block = fetch(daemon, height)?;
    match format {
        Format::Json => println!("{}", chaincache_codec::to_json_pretty(&block.to_record())?),
        Format::Text => print!("{block}"),
    }
    if !block.is_complete() {
        tracing::warn!(height, "daemon did not return every transaction");
    }
    Ok(())
}
