//! Typed daemon calls.

mod convert;

use crate::client::RpcClient;
use crate::config::RpcConfig;
use crate::error::{RpcError, RpcResult};
use crate::http::HttpClient;
use chaincache_core::{Block, Header, Transaction, Value};
use convert::{check_status, embedded_json, member};
use tracing::debug;

/// Fetches chain data from a daemon as partial entities.
///
/// Every call returns whatever the daemon knows in one response; callers
/// fold the results into their cached entities with `merge`.
pub struct DaemonClient<C: HttpClient> {
    rpc: RpcClient<C>,
}

impl<C: HttpClient> DaemonClient<C> {
    /// Wraps an RPC client.
    pub fn new(rpc: RpcClient<C>) -> Self {
        Self { rpc }
    }

    /// Creates a client for the endpoint described by `config`.
    pub fn from_config(config: RpcConfig, client: C) -> Self {
        Self::new(RpcClient::new(config, client))
    }

    /// Returns the underlying RPC client.
    pub fn rpc(&self) -> &RpcClient<C> {
        &self.rpc
    }

    /// Number of blocks in the daemon's chain.
    ///
    /// # Errors
    ///
    /// Returns an RPC error, or [`RpcError::Protocol`] if the count is
    /// missing.
    pub fn get_height(&self) -> RpcResult<u64> {
        let result = self
            .rpc
            .send_json_request("get_block_count", Value::empty_map())?;
        check_status(&result)?;
        member(&result, "count")?
            .as_u64()
            .ok_or_else(|| RpcError::protocol("count is not an unsigned integer"))
    }

    /// Header of the block at `height`.
    ///
    /// # Errors
    ///
    /// Returns an RPC error; [`RpcError::is_not_found`] holds for heights
    /// past the tip.
    pub fn get_block_header_by_height(&self, height: u64) -> RpcResult<Header> {
        let result = self
            .rpc
            .send_json_request("get_block_header_by_height", height_params(height))?;
        check_status(&result)?;
        convert::header(member(&result, "block_header")?)
    }

    /// Block at `height` with its header, coinbase and transaction ids.
    ///
    /// Non-coinbase transactions are known only by id; fetch their bodies
    /// with [`get_transactions`](Self::get_transactions).
    ///
    /// # Errors
    ///
    /// Returns an RPC error; [`RpcError::is_not_found`] holds for heights
    /// past the tip.
    pub fn get_block_by_height(&self, height: u64) -> RpcResult<Block> {
        let result = self
            .rpc
            .send_json_request("get_block", height_params(height))?;
        check_status(&result)?;

        let header = convert::header(member(&result, "block_header")?)?;
        let json = embedded_json(&result, "json")?;
        let miner_tx_id = result
            .get("miner_tx_hash")
            .and_then(Value::as_text)
            .or(header.miner_tx_id.as_deref());
        let coinbase = convert::miner_tx(member(&json, "miner_tx")?, miner_tx_id, header.height)?;
        let tx_ids: Vec<String> = result
            .get("tx_hashes")
            .or_else(|| json.get("tx_hashes"))
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_text).map(str::to_string).collect())
            .unwrap_or_default();

        let mut block = Block::new()
            .with_header(header)
            .with_coinbase_tx(coinbase)
            .with_tx_ids(tx_ids);
        if let Some(blob) = result.get("blob").and_then(Value::as_text) {
            block.set_hex(Some(blob.to_string()));
        }
        debug!(height, txs = block.tx_ids().map_or(0, <[String]>::len), "fetched block");
        Ok(block)
    }

    /// Full records of the transactions with the given ids.
    ///
    /// Ids the daemon does not know are skipped.
    ///
    /// # Errors
    ///
    /// Returns an RPC error or a malformed-response error.
    pub fn get_transactions(&self, ids: &[String]) -> RpcResult<Vec<Transaction>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let params = Value::map(vec![
            (
                "txs_hashes".to_string(),
                Value::Array(ids.iter().map(|id| Value::from(id.as_str())).collect()),
            ),
            ("decode_as_json".to_string(), Value::Bool(true)),
        ]);
        let response = self.rpc.send_path_request("get_transactions", params)?;
        check_status(&response)?;

        if let Some(missed) = response.get("missed_tx").and_then(Value::as_array) {
            if !missed.is_empty() {
                debug!(missed = missed.len(), "daemon missed transactions");
            }
        }
        response
            .get("txs")
            .and_then(Value::as_array)
            .unwrap_or_default()
            .iter()
            .map(convert::transaction)
            .collect()
    }
}

fn height_params(height: u64) -> Value {
    Value::map(vec![("height".to_string(), Value::from(height))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockHttpClient;

    fn daemon(body: &str) -> DaemonClient<MockHttpClient> {
        DaemonClient::from_config(
            RpcConfig::default().with_max_requests_per_second(0),
            MockHttpClient::fixed(body),
        )
    }

    #[test]
    fn height_from_block_count() {
        let client = daemon(r#"{"result":{"count":3100000,"status":"OK"}}"#);
        assert_eq!(client.get_height().unwrap(), 3_100_000);
    }

    #[test]
    fn busy_status_is_an_error() {
        let client = daemon(r#"{"result":{"count":1,"status":"BUSY"}}"#);
        assert!(matches!(client.get_height(), Err(RpcError::Status(_))));
    }

    #[test]
    fn header_by_height() {
        let client = daemon(
            r#"{"result":{"block_header":{"height":5,"hash":"h5","difficulty":9},"status":"OK"}}"#,
        );
        let header = client.get_block_header_by_height(5).unwrap();
        assert_eq!(header.height, Some(5));
        assert_eq!(header.difficulty, Some(9));
    }

    #[test]
    fn empty_id_list_sends_nothing() {
        let client = daemon("{}");
        assert!(client.get_transactions(&[]).unwrap().is_empty());
    }

    #[test]
    fn block_past_tip_is_not_found() {
        let client = daemon(r#"{"error":{"code":-2,"message":"Requested block height: 9 greater than current top block height: 4"}}"#);
        assert!(client.get_block_by_height(9).unwrap_err().is_not_found());
    }
}
