//! Transaction entity and its input/output records.

use super::handle::BlockHandle;
use super::record::{heading, joined, kv_line, records, Fields, RecordBuilder};
use crate::error::{CoreError, CoreResult};
use crate::reconcile::reconcile_fields;
use chaincache_codec::{ToRecord, Value};
use std::fmt;
use tracing::debug;

/// A spent output referenced by a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxInput {
    /// Key image, hex encoded.
    pub key_image: Option<String>,
    /// Amount in atomic units (zero for confidential amounts).
    pub amount: Option<u64>,
    /// Global indices of the ring members.
    pub ring_output_indices: Option<Vec<u64>>,
}

impl TxInput {
    /// Builds an input from a partial record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] on a malformed record.
    pub fn from_record(record: &Value) -> CoreResult<Self> {
        let fields = Fields::of("input", record)?;
        Ok(Self {
            key_image: fields.text("keyImage")?,
            amount: fields.u64("amount")?,
            ring_output_indices: fields.u64_list("ringOutputIndices")?,
        })
    }
}

impl ToRecord for TxInput {
    fn to_record(&self) -> Value {
        RecordBuilder::new()
            .field("keyImage", self.key_image.clone())
            .field("amount", self.amount)
            .field("ringOutputIndices", self.ring_output_indices.clone())
            .build()
    }
}

/// An output created by a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxOutput {
    /// Global output index.
    pub index: Option<u64>,
    /// Amount in atomic units (zero for confidential amounts).
    pub amount: Option<u64>,
    /// One-time public key, hex encoded.
    pub stealth_public_key: Option<String>,
}

impl TxOutput {
    /// Builds an output from a partial record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] on a malformed record.
    pub fn from_record(record: &Value) -> CoreResult<Self> {
        let fields = Fields::of("output", record)?;
        Ok(Self {
            index: fields.u64("index")?,
            amount: fields.u64("amount")?,
            stealth_public_key: fields.text("stealthPublicKey")?,
        })
    }
}

impl ToRecord for TxOutput {
    fn to_record(&self) -> Value {
        RecordBuilder::new()
            .field("index", self.index)
            .field("amount", self.amount)
            .field("stealthPublicKey", self.stealth_public_key.clone())
            .build()
    }
}

/// A transaction, identified by its id.
///
/// Besides its own fields a transaction may carry a back-reference to the
/// block that currently holds it. The back-reference is for traversal only:
/// it takes no part in equality, and merges never reconcile it.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    /// Transaction hash, hex encoded. The identity key.
    pub id: Option<String>,
    /// Transaction format version.
    pub version: Option<u64>,
    /// Unlock time (height or timestamp).
    pub unlock_time: Option<u64>,
    /// Fee in atomic units.
    pub fee: Option<u64>,
    /// Size in bytes.
    pub size: Option<u64>,
    /// Weight.
    pub weight: Option<u64>,
    /// Whether this is a block's coinbase (miner) transaction.
    pub is_coinbase: Option<bool>,
    /// Whether the transaction is in a block.
    pub is_confirmed: Option<bool>,
    /// Whether the transaction sits in the daemon's pool.
    pub in_pool: Option<bool>,
    /// Height of the containing block.
    pub height: Option<u64>,
    /// Extra field, hex encoded.
    pub extra: Option<String>,
    /// Ring signatures, hex encoded.
    pub signatures: Option<Vec<String>>,
    /// Spent outputs.
    pub inputs: Option<Vec<TxInput>>,
    /// Created outputs.
    pub outputs: Option<Vec<TxOutput>>,
    /// Global indices of the created outputs.
    pub output_indices: Option<Vec<u64>>,
    /// Full serialized transaction, hex encoded.
    pub hex: Option<String>,
    block: Option<BlockHandle>,
}

impl Transaction {
    /// Creates an empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transaction known only by its id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Builds a transaction from a partial record.
    ///
    /// Nested `inputs` and `outputs` records are upgraded to [`TxInput`]
    /// and [`TxOutput`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] on a malformed record.
    pub fn from_record(record: &Value) -> CoreResult<Self> {
        let fields = Fields::of("transaction", record)?;
        Ok(Self {
            id: fields.text("id")?,
            version: fields.u64("version")?,
            unlock_time: fields.u64("unlockTime")?,
            fee: fields.u64("fee")?,
            size: fields.u64("size")?,
            weight: fields.u64("weight")?,
            is_coinbase: fields.bool("isCoinbase")?,
            is_confirmed: fields.bool("isConfirmed")?,
            in_pool: fields.bool("inPool")?,
            height: fields.u64("height")?,
            extra: fields.text("extra")?,
            signatures: fields.text_list("signatures")?,
            inputs: fields.list("inputs", TxInput::from_record)?,
            outputs: fields.list("outputs", TxOutput::from_record)?,
            output_indices: fields.u64_list("outputIndices")?,
            hex: fields.text("hex")?,
            block: None,
        })
    }

    /// Handle of the block currently holding this transaction.
    pub fn block(&self) -> Option<BlockHandle> {
        self.block
    }

    /// Points the back-reference at `block`.
    pub fn set_block(&mut self, block: Option<BlockHandle>) -> &mut Self {
        self.block = block;
        self
    }

    /// Folds `other` into this transaction.
    ///
    /// Fields reconcile as for headers. This transaction keeps its own
    /// back-reference and adopts `other`'s only when it has none. The merge
    /// is all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IdentityMismatch`] if both ids are present and
    /// differ, or [`CoreError::Conflict`] if a field disagrees.
    pub fn merge(&mut self, other: &Transaction) -> CoreResult<()> {
        if let (Some(current), Some(incoming)) = (&self.id, &other.id) {
            if current != incoming {
                return Err(CoreError::identity_mismatch(current, incoming));
            }
        }
        let merged = reconcile_fields!(Transaction, self, other, {
            id,
            version,
            unlock_time,
            fee,
            size,
            weight,
            is_coinbase,
            is_confirmed,
            in_pool,
            height,
            extra,
            signatures,
            inputs,
            outputs,
            output_indices,
            hex,
        }, block: self.block.or(other.block));
        if merged != *self {
            debug!(id = ?merged.id, "merged transaction");
        }
        *self = merged;
        Ok(())
    }

    pub(crate) fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        kv_line(f, "Id", self.id.as_deref(), indent)?;
        kv_line(f, "Version", self.version, indent)?;
        kv_line(f, "Unlock time", self.unlock_time, indent)?;
        kv_line(f, "Fee", self.fee, indent)?;
        kv_line(f, "Size", self.size, indent)?;
        kv_line(f, "Weight", self.weight, indent)?;
        kv_line(f, "Is coinbase", self.is_coinbase, indent)?;
        kv_line(f, "Is confirmed", self.is_confirmed, indent)?;
        kv_line(f, "In pool", self.in_pool, indent)?;
        kv_line(f, "Height", self.height, indent)?;
        kv_line(f, "Extra", self.extra.as_deref(), indent)?;
        kv_line(f, "Signatures", self.signatures.as_deref().map(joined), indent)?;
        kv_line(
            f,
            "Output indices",
            self.output_indices.as_deref().map(joined),
            indent,
        )?;
        if let Some(inputs) = &self.inputs {
            heading(f, "Inputs", indent)?;
            for (i, input) in inputs.iter().enumerate() {
                heading(f, &format!("Input {}", i + 1), indent + 1)?;
                kv_line(f, "Key image", input.key_image.as_deref(), indent + 2)?;
                kv_line(f, "Amount", input.amount, indent + 2)?;
                kv_line(
                    f,
                    "Ring output indices",
                    input.ring_output_indices.as_deref().map(joined),
                    indent + 2,
                )?;
            }
        }
        if let Some(outputs) = &self.outputs {
            heading(f, "Outputs", indent)?;
            for (i, output) in outputs.iter().enumerate() {
                heading(f, &format!("Output {}", i + 1), indent + 1)?;
                kv_line(f, "Index", output.index, indent + 2)?;
                kv_line(f, "Amount", output.amount, indent + 2)?;
                kv_line(
                    f,
                    "Stealth public key",
                    output.stealth_public_key.as_deref(),
                    indent + 2,
                )?;
            }
        }
        kv_line(f, "Hex", self.hex.as_deref(), indent)
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        let Self {
            id,
            version,
            unlock_time,
            fee,
            size,
            weight,
            is_coinbase,
            is_confirmed,
            in_pool,
            height,
            extra,
            signatures,
            inputs,
            outputs,
            output_indices,
            hex,
            block: _,
        } = self;
        *id == other.id
            && *version == other.version
            && *unlock_time == other.unlock_time
            && *fee == other.fee
            && *size == other.size
            && *weight == other.weight
            && *is_coinbase == other.is_coinbase
            && *is_confirmed == other.is_confirmed
            && *in_pool == other.in_pool
            && *height == other.height
            && *extra == other.extra
            && *signatures == other.signatures
            && *inputs == other.inputs
            && *outputs == other.outputs
            && *output_indices == other.output_indices
            && *hex == other.hex
    }
}

impl Eq for Transaction {}

impl ToRecord for Transaction {
    fn to_record(&self) -> Value {
        RecordBuilder::new()
            .field("id", self.id.clone())
            .field("version", self.version)
            .field("unlockTime", self.unlock_time)
            .field("fee", self.fee)
            .field("size", self.size)
            .field("weight", self.weight)
            .field("isCoinbase", self.is_coinbase)
            .field("isConfirmed", self.is_confirmed)
            .field("inPool", self.in_pool)
            .field("height", self.height)
            .field("extra", self.extra.clone())
            .field("signatures", self.signatures.clone())
            .field("inputs", self.inputs.as_deref().map(records))
            .field("outputs", self.outputs.as_deref().map(records))
            .field("outputIndices", self.output_indices.clone())
            .field("hex", self.hex.clone())
            .build()
    }
}

impl TryFrom<&Value> for Transaction {
    type Error = CoreError;

    fn try_from(record: &Value) -> CoreResult<Self> {
        Self::from_record(record)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}
