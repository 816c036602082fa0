//! Block entity and the block merge.

use super::handle::BlockHandle;
use super::header::Header;
use super::record::{heading, joined, kv_line, records, Fields, RecordBuilder};
use super::transaction::Transaction;
use crate::error::{CoreError, CoreResult};
use crate::reconcile::reconcile;
use chaincache_codec::{ToRecord, Value};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace};

/// A block: a header plus the transactions it owns.
///
/// Every owned transaction (the coinbase and each entry of `txs`) points
/// back at this block's [`BlockHandle`]. The setters below keep that
/// invariant, which is why the fields are private.
///
/// Equality compares content only; the handle is ignored.
#[derive(Debug, Clone)]
pub struct Block {
    handle: BlockHandle,
    header: Option<Header>,
    coinbase_tx: Option<Transaction>,
    txs: Option<Vec<Transaction>>,
    tx_ids: Option<Vec<String>>,
    hex: Option<String>,
}

impl Default for Block {
    fn default() -> Self {
        Self::new()
    }
}

impl Block {
    /// Creates an empty block with a fresh handle.
    pub fn new() -> Self {
        Self {
            handle: BlockHandle::new(),
            header: None,
            coinbase_tx: None,
            txs: None,
            tx_ids: None,
            hex: None,
        }
    }

    /// Builds a block from a partial record.
    ///
    /// The nested `header`, `coinbaseTx` and `txs` records are upgraded to
    /// entities and attached to the new block.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] on a malformed record.
    pub fn from_record(record: &Value) -> CoreResult<Self> {
        let fields = Fields::of("block", record)?;
        let mut block = Self::new();
        block.header = fields.raw("header").map(Header::from_record).transpose()?;
        block.set_coinbase_tx(
            fields
                .raw("coinbaseTx")
                .map(Transaction::from_record)
                .transpose()?,
        );
        block.set_txs(fields.list("txs", Transaction::from_record)?);
        block.tx_ids = fields.text_list("txIds")?;
        block.hex = fields.text("hex")?;
        Ok(block)
    }

    /// Returns a copy of this block with a new handle.
    ///
    /// The copy's transactions point at the copy, not at this block.
    #[must_use]
    pub fn copy(&self) -> Self {
        let mut copy = self.clone();
        copy.handle = BlockHandle::new();
        copy.attach_all();
        copy
    }

    /// Handle identifying this block instance.
    pub fn handle(&self) -> BlockHandle {
        self.handle
    }

    /// The header, if known.
    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// Height from the header, if known.
    pub fn height(&self) -> Option<u64> {
        self.header.as_ref().and_then(|h| h.height)
    }

    /// Block hash from the header, if known.
    pub fn id(&self) -> Option<&str> {
        self.header.as_ref().and_then(|h| h.id.as_deref())
    }

    /// The coinbase transaction, if known.
    pub fn coinbase_tx(&self) -> Option<&Transaction> {
        self.coinbase_tx.as_ref()
    }

    /// Non-coinbase transactions with full records.
    pub fn txs(&self) -> Option<&[Transaction]> {
        self.txs.as_deref()
    }

    /// Ids of the non-coinbase transactions.
    pub fn tx_ids(&self) -> Option<&[String]> {
        self.tx_ids.as_deref()
    }

    /// Serialized block, hex encoded.
    pub fn hex(&self) -> Option<&str> {
        self.hex.as_deref()
    }

    /// Iterates over the coinbase and every non-coinbase transaction.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.coinbase_tx
            .iter()
            .chain(self.txs.iter().flatten())
    }

    /// Finds an owned transaction by id.
    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions().find(|tx| tx.id.as_deref() == Some(id))
    }

    /// Returns true if the header is known and every id in `tx_ids` has a
    /// full transaction in `txs`.
    pub fn is_complete(&self) -> bool {
        if self.header.is_none() {
            return false;
        }
        let txs = self.txs.as_deref().unwrap_or_default();
        self.tx_ids
            .iter()
            .flatten()
            .all(|id| txs.iter().any(|tx| tx.id.as_ref() == Some(id)))
    }

    /// Replaces the header.
    pub fn set_header(&mut self, header: Option<Header>) -> &mut Self {
        self.header = header;
        self
    }

    /// Replaces the coinbase transaction and attaches it to this block.
    pub fn set_coinbase_tx(&mut self, tx: Option<Transaction>) -> &mut Self {
        self.coinbase_tx = tx;
        self.attach_all();
        self
    }

    /// Replaces the transaction list and attaches every entry to this block.
    pub fn set_txs(&mut self, txs: Option<Vec<Transaction>>) -> &mut Self {
        self.txs = txs;
        self.attach_all();
        self
    }

    /// Replaces the transaction id list.
    pub fn set_tx_ids(&mut self, tx_ids: Option<Vec<String>>) -> &mut Self {
        self.tx_ids = tx_ids;
        self
    }

    /// Replaces the serialized block.
    pub fn set_hex(&mut self, hex: Option<String>) -> &mut Self {
        self.hex = hex;
        self
    }

    /// Sets the header.
    #[must_use]
    pub fn with_header(mut self, header: Header) -> Self {
        self.set_header(Some(header));
        self
    }

    /// Sets the coinbase transaction.
    #[must_use]
    pub fn with_coinbase_tx(mut self, tx: Transaction) -> Self {
        self.set_coinbase_tx(Some(tx));
        self
    }

    /// Sets the transaction list.
    #[must_use]
    pub fn with_txs(mut self, txs: Vec<Transaction>) -> Self {
        self.set_txs(Some(txs));
        self
    }

    /// Sets the transaction id list.
    #[must_use]
    pub fn with_tx_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_tx_ids(Some(ids.into_iter().map(Into::into).collect()));
        self
    }

    /// Sets the serialized block.
    #[must_use]
    pub fn with_hex(mut self, hex: impl Into<String>) -> Self {
        self.set_hex(Some(hex.into()));
        self
    }

    /// Folds `other` into this block.
    ///
    /// In order: the header and the coinbase are adopted if absent here and
    /// merged otherwise; the transaction list is adopted if absent here,
    /// otherwise each incoming transaction is merged into the entry with the
    /// same id or appended (id-less transactions pair up by position); every
    /// owned transaction is then pointed at this
    /// block; finally `tx_ids` and `hex` are reconciled.
    ///
    /// Merging a snapshot of this same instance is a no-op. The merge is
    /// all-or-nothing: on error this block is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Conflict`] or [`CoreError::IdentityMismatch`]
    /// from the nested header and transaction merges, or a conflict on
    /// `hex`.
    pub fn merge(&mut self, other: &Block) -> CoreResult<()> {
        if self.handle == other.handle && *self == *other {
            trace!(handle = %self.handle, "skipping self-merge");
            return Ok(());
        }

        let mut merged = self.clone();
        merged.header = merge_owned(merged.header.take(), other.header.as_ref(), Header::merge)?;
        merged.coinbase_tx = merge_owned(
            merged.coinbase_tx.take(),
            other.coinbase_tx.as_ref(),
            Transaction::merge,
        )?;
        merged.txs = match (merged.txs.take(), other.txs.as_deref()) {
            (None, incoming) => incoming.map(<[Transaction]>::to_vec),
            (Some(txs), None) => Some(txs),
            (Some(mut txs), Some(incoming)) => {
                merge_tx_list(&mut txs, incoming)?;
                Some(txs)
            }
        };
        merged.attach_all();
        merged.tx_ids = reconcile("tx_ids", merged.tx_ids.as_ref(), other.tx_ids.as_ref())?;
        merged.hex = reconcile("hex", merged.hex.as_ref(), other.hex.as_ref())?;

        if merged != *self {
            debug!(
                height = ?merged.height(),
                txs = merged.txs.as_ref().map_or(0, Vec::len),
                "merged block"
            );
        }
        *self = merged;
        Ok(())
    }

    fn attach_all(&mut self) {
        let handle = Some(self.handle);
        if let Some(tx) = &mut self.coinbase_tx {
            tx.set_block(handle);
        }
        for tx in self.txs.iter_mut().flatten() {
            tx.set_block(handle);
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        if let Some(header) = &self.header {
            heading(f, "Header", indent)?;
            header.write_indented(f, indent + 1)?;
        }
        if let Some(tx) = &self.coinbase_tx {
            heading(f, "Coinbase tx", indent)?;
            tx.write_indented(f, indent + 1)?;
        }
        if let Some(txs) = &self.txs {
            heading(f, "Txs", indent)?;
            for (i, tx) in txs.iter().enumerate() {
                heading(f, &format!("Tx {}", i + 1), indent + 1)?;
                tx.write_indented(f, indent + 2)?;
            }
        }
        kv_line(f, "Tx ids", self.tx_ids.as_deref().map(joined), indent)?;
        kv_line(f, "Hex", self.hex.as_deref(), indent)
    }
}

/// Adopts `incoming` when `current` is absent, otherwise merges into it.
fn merge_owned<T: Clone>(
    current: Option<T>,
    incoming: Option<&T>,
    merge: fn(&mut T, &T) -> CoreResult<()>,
) -> CoreResult<Option<T>> {
    match (current, incoming) {
        (None, incoming) => Ok(incoming.cloned()),
        (Some(current), None) => Ok(Some(current)),
        (Some(mut current), Some(incoming)) => {
            merge(&mut current, incoming)?;
            Ok(Some(current))
        }
    }
}

/// Merges `incoming` into `txs` by id, appending unmatched transactions.
///
/// Transactions without an id pair up by position: the k-th id-less
/// incoming transaction merges into the k-th id-less entry of `txs`.
fn merge_tx_list(txs: &mut Vec<Transaction>, incoming: &[Transaction]) -> CoreResult<()> {
    let mut by_id: HashMap<String, usize> = HashMap::with_capacity(txs.len() + incoming.len());
    let mut anonymous = Vec::new();
    for (i, tx) in txs.iter().enumerate() {
        match &tx.id {
            Some(id) => {
                by_id.entry(id.clone()).or_insert(i);
            }
            None => anonymous.push(i),
        }
    }

    let mut next_anonymous = 0;
    for tx in incoming {
        let slot = match &tx.id {
            Some(id) => by_id.get(id).copied(),
            None => {
                next_anonymous += 1;
                anonymous.get(next_anonymous - 1).copied()
            }
        };
        match slot {
            Some(i) => txs[i].merge(tx)?,
            None => {
                match &tx.id {
                    Some(id) => {
                        by_id.insert(id.clone(), txs.len());
                    }
                    None => anonymous.push(txs.len()),
                }
                txs.push(tx.clone());
            }
        }
    }
    Ok(())
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
            && self.coinbase_tx == other.coinbase_tx
            && self.txs == other.txs
            && self.tx_ids == other.tx_ids
            && self.hex == other.hex
    }
}

impl Eq for Block {}

impl ToRecord for Block {
    fn to_record(&self) -> Value {
        RecordBuilder::new()
            .field("header", self.header.as_ref().map(ToRecord::to_record))
            .field("coinbaseTx", self.coinbase_tx.as_ref().map(ToRecord::to_record))
            .field("txs", self.txs.as_deref().map(records))
            .field("txIds", self.tx_ids.clone())
            .field("hex", self.hex.clone())
            .build()
    }
}

impl TryFrom<&Value> for Block {
    type Error = CoreError;

    fn try_from(record: &Value) -> CoreResult<Self> {
        Self::from_record(record)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaincache_codec::from_json;

    fn tx(id: &str) -> Transaction {
        Transaction::with_id(id)
    }

    fn tx_with_fee(id: &str, fee: u64) -> Transaction {
        let mut tx = tx(id);
        tx.fee = Some(fee);
        tx
    }

    fn sorted_ids(block: &Block) -> Vec<String> {
        let mut ids: Vec<String> = block
            .txs()
            .unwrap_or_default()
            .iter()
            .filter_map(|tx| tx.id.clone())
            .collect();
        ids.sort();
        ids
    }

    #[test]
    fn different_txs_are_unioned_and_attached_to_target() {
        let mut a = Block::new().with_txs(vec![tx("t1")]);
        let b = Block::new().with_txs(vec![tx("t2")]);
        a.merge(&b).unwrap();

        let txs = a.txs().unwrap();
        assert_eq!(txs.len(), 2);
        assert!(txs.iter().all(|t| t.block() == Some(a.handle())));
        assert_eq!(b.txs().unwrap()[0].block(), Some(b.handle()));
    }

    #[test]
    fn same_id_tx_is_merged_not_duplicated() {
        let mut a = Block::new().with_txs(vec![tx("t1")]);
        let b = Block::new().with_txs(vec![tx_with_fee("t1", 5)]);
        a.merge(&b).unwrap();
        let txs = a.txs().unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].fee, Some(5));
    }

    #[test]
    fn absent_parts_are_adopted_and_reattached() {
        let header = Header::new().with_height(10);
        let mut a = Block::new();
        let b = Block::new()
            .with_header(header.clone())
            .with_coinbase_tx(tx("cb"))
            .with_txs(vec![tx("t1")]);
        a.merge(&b).unwrap();
        assert_eq!(a.header(), Some(&header));
        assert_eq!(a.coinbase_tx().unwrap().block(), Some(a.handle()));
        assert_eq!(a.txs().unwrap()[0].block(), Some(a.handle()));
    }

    #[test]
    fn self_merge_is_a_no_op() {
        let mut block = Block::new()
            .with_header(Header::new().with_height(1))
            .with_txs(vec![tx("t1")])
            .with_tx_ids(["t1"]);
        let snapshot = block.clone();
        block.merge(&snapshot).unwrap();
        assert_eq!(block, snapshot);
        assert_eq!(block.handle(), snapshot.handle());
    }

    #[test]
    fn merge_is_idempotent() {
        let mut a = Block::new()
            .with_header(Header::new().with_height(3))
            .with_txs(vec![tx("t1")])
            .with_tx_ids(["t1"]);
        let x = Block::new()
            .with_txs(vec![tx_with_fee("t1", 2), tx("t2")])
            .with_tx_ids(["t2"])
            .with_hex("00");
        a.merge(&x).unwrap();
        let once = a.clone();
        a.merge(&x).unwrap();
        assert_eq!(a, once);
    }

    #[test]
    fn merge_is_information_commutative() {
        let a = Block::new()
            .with_header(Header::new().with_height(3))
            .with_txs(vec![tx("t1")])
            .with_tx_ids(["t1"]);
        let b = Block::new()
            .with_header(Header::new().with_id("h"))
            .with_txs(vec![tx_with_fee("t1", 2), tx("t2")])
            .with_tx_ids(["t2"]);

        let mut ab = a.copy();
        ab.merge(&b).unwrap();
        let mut ba = b.copy();
        ba.merge(&a).unwrap();

        assert_eq!(ab.header(), ba.header());
        assert_eq!(sorted_ids(&ab), sorted_ids(&ba));
        assert_eq!(ab.transaction("t1"), ba.transaction("t1"));
        let mut ab_ids = ab.tx_ids().unwrap().to_vec();
        let mut ba_ids = ba.tx_ids().unwrap().to_vec();
        ab_ids.sort();
        ba_ids.sort();
        assert_eq!(ab_ids, ba_ids);
    }

    #[test]
    fn failed_merge_leaves_block_unchanged() {
        let mut a = Block::new()
            .with_header(Header::new().with_height(3))
            .with_txs(vec![tx_with_fee("t1", 1)]);
        let b = Block::new()
            .with_header(Header::new().with_height(3).with_id("h"))
            .with_txs(vec![tx("t0"), tx_with_fee("t1", 9)]);
        let before = a.clone();
        let err = a.merge(&b).unwrap_err();
        assert!(matches!(err, CoreError::Conflict { ref field, .. } if field == "fee"));
        assert_eq!(a, before);
    }

    #[test]
    fn txs_without_ids_pair_up_by_position() {
        let mut anonymous = Transaction::new();
        anonymous.fee = Some(7);
        let mut a = Block::new().with_txs(vec![tx("t1")]);
        let x = Block::new().with_txs(vec![anonymous.clone(), Transaction::new()]);

        a.merge(&x).unwrap();
        let once = a.clone();
        assert_eq!(once.txs().unwrap().len(), 3);
        a.merge(&x).unwrap();
        assert_eq!(a, once);

        let mut sized = Transaction::new();
        sized.size = Some(90);
        a.merge(&Block::new().with_txs(vec![sized])).unwrap();
        let first = &a.txs().unwrap()[1];
        assert_eq!((first.fee, first.size), (Some(7), Some(90)));
        assert_eq!(a.txs().unwrap().len(), 3);
    }

    #[test]
    fn copy_gets_a_new_handle_and_reattaches() {
        let block = Block::new().with_coinbase_tx(tx("cb")).with_txs(vec![tx("t1")]);
        let copy = block.copy();
        assert_ne!(copy.handle(), block.handle());
        assert_eq!(copy, block);
        assert!(copy.transactions().all(|t| t.block() == Some(copy.handle())));
    }

    #[test]
    fn completeness_requires_header_and_every_listed_tx() {
        let mut block = Block::new().with_tx_ids(["t1", "t2"]);
        assert!(!block.is_complete());
        block.set_header(Some(Header::new().with_height(1)));
        block.set_txs(Some(vec![tx("t1")]));
        assert!(!block.is_complete());
        block.set_txs(Some(vec![tx("t1"), tx("t2")]));
        assert!(block.is_complete());
        assert!(Block::new().with_header(Header::new()).is_complete());
    }

    #[test]
    fn record_construction_upgrades_nested_entities() {
        let record = from_json(
            r#"{
                "header": {"height": 12, "id": "hh"},
                "coinbaseTx": {"id": "cb", "isCoinbase": true},
                "txs": [{"id": "t1", "fee": 3}],
                "txIds": ["t1"],
                "hex": "0a0b"
            }"#,
        )
        .unwrap();
        let block = Block::try_from(&record).unwrap();
        assert_eq!(block.height(), Some(12));
        assert_eq!(block.id(), Some("hh"));
        assert_eq!(block.transaction("cb").unwrap().is_coinbase, Some(true));
        assert_eq!(block.transaction("t1").unwrap().block(), Some(block.handle()));
        assert!(block.is_complete());
        assert_eq!(Block::from_record(&block.to_record()).unwrap(), block);
    }

    #[test]
    fn display_nests_entities() {
        let block = Block::new()
            .with_header(Header::new().with_height(4))
            .with_txs(vec![tx("t1")]);
        assert_eq!(
            block.to_string(),
            "Header:\n  Height: 4\nTxs:\n  Tx 1:\n    Id: t1\n"
        );
    }
}
