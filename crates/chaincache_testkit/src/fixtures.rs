//! Sample entities and a simulated daemon.
//!
//! [`FakeChain`] answers daemon requests for a deterministic chain so RPC
//! and cache-filling code can be tested without a node.

use chaincache_core::{Block, Header, Transaction, TxOutput};
use serde_json::{json, Value as Json};
use std::collections::HashSet;

/// A header with every field set for the block at `height`.
pub fn sample_header(height: u64) -> Header {
    let mut header = Header::new()
        .with_height(height)
        .with_id(block_id(height));
    header.timestamp = Some(1_700_000_000 + height * 120);
    header.difficulty = Some(250_000_000_000);
    header.nonce = Some(height * 7);
    header.size = Some(1_500);
    header.reward = Some(600_000_000_000);
    header.depth = Some(0);
    header.major_version = Some(16);
    header.minor_version = Some(16);
    header.prev_id = height.checked_sub(1).map(block_id);
    header.orphan_status = Some(false);
    header
}

/// A confirmed transaction with the given id.
pub fn sample_tx(id: &str) -> Transaction {
    let mut tx = Transaction::with_id(id);
    tx.version = Some(2);
    tx.unlock_time = Some(0);
    tx.fee = Some(30_000_000);
    tx.is_coinbase = Some(false);
    tx.is_confirmed = Some(true);
    tx.in_pool = Some(false);
    tx.outputs = Some(vec![TxOutput {
        index: None,
        amount: Some(0),
        stealth_public_key: Some(format!("{id}-pk")),
    }]);
    tx
}

/// A complete block at `height` with `tx_count` transactions.
pub fn sample_block(height: u64, tx_count: usize) -> Block {
    let txs: Vec<_> = (0..tx_count).map(|i| sample_tx(&tx_id(height, i))).collect();
    let mut header = sample_header(height);
    header.num_txs = Some(tx_count as u64);
    Block::new()
        .with_header(header)
        .with_tx_ids(txs.iter().filter_map(|tx| tx.id.clone()))
        .with_txs(txs)
}

/// Id of the block at `height` on every fixture chain.
pub fn block_id(height: u64) -> String {
    format!("{height:064x}")
}

/// Id of the `index`th transaction of the block at `height`.
pub fn tx_id(height: u64, index: usize) -> String {
    format!("t{height}-{index}")
}

/// Id of the coinbase transaction of the block at `height`.
pub fn miner_tx_id(height: u64) -> String {
    format!("cb{height}")
}

/// A simulated daemon serving a chain of `height` blocks.
///
/// Block `h` holds `txs_per_block` transactions with ids from [`tx_id`].
#[derive(Debug, Clone)]
pub struct FakeChain {
    /// Number of blocks; the tip is `height - 1`.
    pub height: u64,
    /// Non-coinbase transactions in every block.
    pub txs_per_block: usize,
    hidden: HashSet<String>,
}

impl FakeChain {
    /// Creates a chain of `height` blocks.
    pub fn new(height: u64, txs_per_block: usize) -> Self {
        Self {
            height,
            txs_per_block,
            hidden: HashSet::new(),
        }
    }

    /// Makes the daemon report `id` as missed in `get_transactions`.
    #[must_use]
    pub fn hide_tx(mut self, id: impl Into<String>) -> Self {
        self.hidden.insert(id.into());
        self
    }

    /// Serves a previously hidden transaction again.
    pub fn reveal_tx(&mut self, id: &str) {
        self.hidden.remove(id);
    }

    /// Answers one HTTP request, as a `HttpClient` handler would.
    ///
    /// # Errors
    ///
    /// Returns a message for bodies that are not JSON and for unknown paths.
    pub fn respond(&self, url: &str, body: &[u8]) -> Result<Vec<u8>, String> {
        let request: Json = serde_json::from_slice(body).map_err(|e| e.to_string())?;
        let response = if url.ends_with("/json_rpc") {
            let method = request["method"].as_str().unwrap_or_default();
            self.json_rpc(method, &request["params"])
        } else if url.ends_with("/get_transactions") {
            self.get_transactions(&request)
        } else {
            return Err(format!("404 Not Found: {url}"));
        };
        Ok(response.to_string().into_bytes())
    }

    fn json_rpc(&self, method: &str, params: &Json) -> Json {
        let height = params["height"].as_u64().unwrap_or_default();
        let result = match method {
            "get_block_count" => json!({ "count": self.height, "status": "OK" }),
            "get_block_header_by_height" | "get_block" if height >= self.height => {
                return json!({
                    "jsonrpc": "2.0",
                    "id": "0",
                    "error": {
                        "code": -2,
                        "message": format!(
                            "Requested block height: {height} greater than current top block height: {}",
                            self.height.saturating_sub(1)
                        ),
                    },
                });
            }
            "get_block_header_by_height" => {
                json!({ "block_header": self.header_json(height), "status": "OK" })
            }
            "get_block" => self.block_json(height),
            _ => {
                return json!({
                    "jsonrpc": "2.0",
                    "id": "0",
                    "error": { "code": -32601, "message": "Method not found" },
                });
            }
        };
        json!({ "jsonrpc": "2.0", "id": "0", "result": result })
    }

    fn header_json(&self, height: u64) -> Json {
        let header = sample_header(height);
        json!({
            "height": height,
            "hash": header.id,
            "prev_hash": header.prev_id.unwrap_or_default(),
            "timestamp": header.timestamp,
            "difficulty": header.difficulty,
            "nonce": header.nonce,
            "block_size": header.size,
            "block_weight": header.size,
            "reward": header.reward,
            "depth": self.height - 1 - height,
            "major_version": header.major_version,
            "minor_version": header.minor_version,
            "num_txes": self.txs_per_block,
            "orphan_status": false,
            "miner_tx_hash": miner_tx_id(height),
        })
    }

    fn tx_ids(&self, height: u64) -> Vec<String> {
        (0..self.txs_per_block).map(|i| tx_id(height, i)).collect()
    }

    fn block_json(&self, height: u64) -> Json {
        let ids = self.tx_ids(height);
        let body = json!({
            "major_version": 16,
            "minor_version": 16,
            "timestamp": 1_700_000_000 + height * 120,
            "prev_id": height.checked_sub(1).map(block_id).unwrap_or_default(),
            "nonce": height * 7,
            "miner_tx": {
                "version": 2,
                "unlock_time": height + 60,
                "vin": [{ "gen": { "height": height } }],
                "vout": [{
                    "amount": 600_000_000_000u64,
                    "target": { "tagged_key": { "key": format!("cbkey{height}"), "view_tag": "00" } },
                }],
                "extra": [1, 2, 3],
                "rct_signatures": { "type": 0 },
            },
            "tx_hashes": ids,
        });
        json!({
            "block_header": self.header_json(height),
            "json": body.to_string(),
            "miner_tx_hash": miner_tx_id(height),
            "tx_hashes": ids,
            "blob": format!("{height:04x}00"),
            "status": "OK",
        })
    }

    fn get_transactions(&self, request: &Json) -> Json {
        let mut txs = Vec::new();
        let mut missed = Vec::new();
        for id in request["txs_hashes"].as_array().into_iter().flatten() {
            let id = id.as_str().unwrap_or_default();
            match self.locate(id) {
                Some(height) if !self.hidden.contains(id) => txs.push(self.tx_json(id, height)),
                _ => missed.push(id.to_string()),
            }
        }
        let mut response = json!({ "txs": txs, "status": "OK" });
        if !missed.is_empty() {
            response["missed_tx"] = json!(missed);
        }
        response
    }

    fn locate(&self, id: &str) -> Option<u64> {
        let (height, index) = id.strip_prefix('t')?.split_once('-')?;
        let height: u64 = height.parse().ok()?;
        let index: usize = index.parse().ok()?;
        (height < self.height && index < self.txs_per_block).then_some(height)
    }

    fn tx_json(&self, id: &str, height: u64) -> Json {
        let body = json!({
            "version": 2,
            "unlock_time": 0,
            "vin": [{ "key": { "amount": 0, "key_offsets": [10, 5, 1], "k_image": format!("{id}-ki") } }],
            "vout": [{ "amount": 0, "target": { "tagged_key": { "key": format!("{id}-pk"), "view_tag": "ab" } } }],
            "extra": [2, 9],
            "rct_signatures": { "type": 6, "txnFee": 30_000_000 },
        });
        json!({
            "tx_hash": id,
            "as_hex": "",
            "as_json": body.to_string(),
            "in_pool": false,
            "block_height": height,
            "output_indices": [height * 100],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(chain: &FakeChain, method: &str, height: u64) -> Json {
        let body = json!({ "method": method, "params": { "height": height } }).to_string();
        let bytes = chain.respond("http://node/json_rpc", body.as_bytes()).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn sample_block_is_complete() {
        let block = sample_block(7, 3);
        assert!(block.is_complete());
        assert_eq!(block.tx_ids().map(<[String]>::len), Some(3));
        assert_eq!(block.height(), Some(7));
    }

    #[test]
    fn block_count_and_tip() {
        let chain = FakeChain::new(5, 1);
        assert_eq!(call(&chain, "get_block_count", 0)["result"]["count"], 5);
        assert_eq!(call(&chain, "get_block", 4)["result"]["status"], "OK");
        assert_eq!(call(&chain, "get_block", 5)["error"]["code"], -2);
    }

    #[test]
    fn hidden_transactions_are_missed() {
        let chain = FakeChain::new(3, 2).hide_tx(tx_id(1, 0));
        let body = json!({ "txs_hashes": [tx_id(1, 0), tx_id(1, 1), "nope"] }).to_string();
        let bytes = chain
            .respond("http://node/get_transactions", body.as_bytes())
            .unwrap();
        let response: Json = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(response["txs"].as_array().unwrap().len(), 1);
        assert_eq!(response["missed_tx"], json!([tx_id(1, 0), "nope"]));
    }

    #[test]
    fn unknown_path_fails() {
        let chain = FakeChain::new(1, 0);
        assert!(chain.respond("http://node/get_info", b"{}").is_err());
    }
}
