//! Mapping daemon responses onto entities.

use crate::error::{RpcError, RpcResult};
use chaincache_core::{Header, Transaction, TxInput, TxOutput, Value};

/// Daemon header keys and the entity record keys they map to.
const HEADER_KEYS: &[(&str, &str)] = &[
    ("height", "height"),
    ("hash", "id"),
    ("timestamp", "timestamp"),
    ("difficulty", "difficulty"),
    ("nonce", "nonce"),
    ("block_size", "size"),
    ("reward", "reward"),
    ("depth", "depth"),
    ("major_version", "majorVersion"),
    ("minor_version", "minorVersion"),
    ("prev_hash", "prevId"),
    ("num_txes", "numTxs"),
    ("orphan_status", "orphanStatus"),
    ("block_weight", "weight"),
    ("long_term_weight", "longTermWeight"),
    ("pow_hash", "powHash"),
    ("miner_tx_hash", "minerTxId"),
];

/// Fails unless a present `status` member reads `OK`.
pub(crate) fn check_status(response: &Value) -> RpcResult<()> {
    match response.get("status").and_then(Value::as_text) {
        Some(status) if status != "OK" => Err(RpcError::Status(status.to_string())),
        _ => Ok(()),
    }
}

/// Required member of a response.
pub(crate) fn member<'a>(response: &'a Value, key: &str) -> RpcResult<&'a Value> {
    response
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| RpcError::protocol(format!("response has no {key}")))
}

/// Decodes a member whose value is a JSON document encoded as text.
pub(crate) fn embedded_json(response: &Value, key: &str) -> RpcResult<Value> {
    let text = member(response, key)?
        .as_text()
        .ok_or_else(|| RpcError::protocol(format!("{key} is not a string")))?;
    Ok(chaincache_codec::from_json(text)?)
}

/// Converts a daemon `block_header` object.
pub(crate) fn header(daemon: &Value) -> RpcResult<Header> {
    let pairs = HEADER_KEYS
        .iter()
        .filter_map(|&(from, to)| daemon.get(from).map(|v| (to.to_string(), v.clone())))
        .collect();
    Ok(Header::from_record(&Value::map(pairs))?)
}

/// Converts the decoded `miner_tx` of a block.
pub(crate) fn miner_tx(json: &Value, id: Option<&str>, height: Option<u64>) -> RpcResult<Transaction> {
    let mut tx = Transaction::new();
    tx.id = id.map(str::to_string);
    tx.is_coinbase = Some(true);
    tx.is_confirmed = Some(true);
    tx.in_pool = Some(false);
    tx.height = height;
    tx_body(json, &mut tx)?;
    Ok(tx)
}

/// Converts one entry of a `get_transactions` response.
pub(crate) fn transaction(entry: &Value) -> RpcResult<Transaction> {
    let mut tx = Transaction::new();
    tx.id = entry.get("tx_hash").and_then(Value::as_text).map(str::to_string);
    tx.hex = entry
        .get("as_hex")
        .and_then(Value::as_text)
        .filter(|hex| !hex.is_empty())
        .map(str::to_string);
    let in_pool = entry.get("in_pool").and_then(Value::as_bool);
    tx.in_pool = in_pool;
    tx.is_confirmed = in_pool.map(|pooled| !pooled);
    if in_pool == Some(false) {
        tx.height = entry.get("block_height").and_then(Value::as_u64);
    }
    tx.output_indices = entry
        .get("output_indices")
        .map(|v| u64_list(v, "output_indices"))
        .transpose()?;
    if entry.get("as_json").and_then(Value::as_text).is_some_and(|t| !t.is_empty()) {
        tx_body(&embedded_json(entry, "as_json")?, &mut tx)?;
    }
    Ok(tx)
}

/// Fills the fields shared by coinbase and regular transaction bodies.
fn tx_body(json: &Value, tx: &mut Transaction) -> RpcResult<()> {
    tx.version = json.get("version").and_then(Value::as_u64);
    tx.unlock_time = json.get("unlock_time").and_then(Value::as_u64);
    tx.extra = json.get("extra").map(extra_hex).transpose()?;
    tx.fee = json
        .get("rct_signatures")
        .and_then(|rct| rct.get("txnFee"))
        .and_then(Value::as_u64);
    tx.signatures = json
        .get("signatures")
        .and_then(Value::as_array)
        .map(|sigs| sigs.iter().filter_map(Value::as_text).map(str::to_string).collect());

    if let Some(vin) = json.get("vin").and_then(Value::as_array) {
        let inputs = vin
            .iter()
            .filter_map(|input| input.get("key"))
            .map(tx_input)
            .collect::<RpcResult<Vec<_>>>()?;
        if !inputs.is_empty() {
            tx.inputs = Some(inputs);
        }
    }
    if let Some(vout) = json.get("vout").and_then(Value::as_array) {
        tx.outputs = Some(vout.iter().map(tx_output).collect());
    }
    Ok(())
}

fn tx_input(key: &Value) -> RpcResult<TxInput> {
    let offsets = key
        .get("key_offsets")
        .map(|v| u64_list(v, "key_offsets"))
        .transpose()?;
    Ok(TxInput {
        key_image: key.get("k_image").and_then(Value::as_text).map(str::to_string),
        amount: key.get("amount").and_then(Value::as_u64),
        ring_output_indices: offsets.map(|o| absolute_offsets(&o)).transpose()?,
    })
}

fn tx_output(output: &Value) -> TxOutput {
    let target = output.get("target");
    let key = target
        .and_then(|t| t.get("key"))
        .or_else(|| target.and_then(|t| t.get("tagged_key")).and_then(|t| t.get("key")));
    TxOutput {
        index: None,
        amount: output.get("amount").and_then(Value::as_u64),
        stealth_public_key: key.and_then(Value::as_text).map(str::to_string),
    }
}

fn u64_list(value: &Value, key: &str) -> RpcResult<Vec<u64>> {
    value
        .as_array()
        .ok_or_else(|| RpcError::protocol(format!("{key} is not an array")))?
        .iter()
        .map(|v| {
            v.as_u64()
                .ok_or_else(|| RpcError::protocol(format!("{key} holds a non-index value")))
        })
        .collect()
}

/// Ring members are sent as offsets from the previous member.
fn absolute_offsets(relative: &[u64]) -> RpcResult<Vec<u64>> {
    let mut total = 0u64;
    relative
        .iter()
        .map(|&offset| {
            total = total
                .checked_add(offset)
                .ok_or_else(|| RpcError::protocol("ring offsets overflow"))?;
            Ok(total)
        })
        .collect()
}

/// The daemon sends `extra` as an array of byte values.
fn extra_hex(value: &Value) -> RpcResult<String> {
    let bytes = value
        .as_array()
        .ok_or_else(|| RpcError::protocol("extra is not an array"))?;
    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let byte = byte
            .as_u64()
            .and_then(|b| u8::try_from(b).ok())
            .ok_or_else(|| RpcError::protocol("extra holds a non-byte value"))?;
        hex.push_str(&format!("{byte:02x}"));
    }
    Ok(hex)
}
