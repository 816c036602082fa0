//! Block header entity.

use super::record::{kv_line, Fields, RecordBuilder};
use crate::error::{CoreError, CoreResult};
use crate::reconcile::reconcile_fields;
use chaincache_codec::{ToRecord, Value};
use std::fmt;
use tracing::debug;

/// Scalar chain facts about one block.
///
/// Every field is optional: a header starts out with whatever a fetch
/// returned and fills in as further partial headers are merged into it.
/// Two present values for the same field must agree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// Block height.
    pub height: Option<u64>,
    /// Block hash, hex encoded.
    pub id: Option<String>,
    /// Unix timestamp.
    pub timestamp: Option<u64>,
    /// Mining difficulty.
    pub difficulty: Option<u64>,
    /// Nonce.
    pub nonce: Option<u64>,
    /// Block size in bytes.
    pub size: Option<u64>,
    /// Miner reward in atomic units.
    pub reward: Option<u64>,
    /// Number of blocks mined on top of this one.
    pub depth: Option<u64>,
    /// Major protocol version.
    pub major_version: Option<u64>,
    /// Minor protocol version.
    pub minor_version: Option<u64>,
    /// Hash of the previous block.
    pub prev_id: Option<String>,
    /// Number of non-coinbase transactions.
    pub num_txs: Option<u64>,
    /// Whether the block is an orphan.
    pub orphan_status: Option<bool>,
    /// Block weight.
    pub weight: Option<u64>,
    /// Long-term block weight.
    pub long_term_weight: Option<u64>,
    /// Proof-of-work hash.
    pub pow_hash: Option<String>,
    /// Id of the coinbase transaction.
    pub miner_tx_id: Option<String>,
}

impl Header {
    /// Creates an empty header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a header from a partial record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if `record` is not a map or a
    /// known key holds a value of the wrong kind.
    pub fn from_record(record: &Value) -> CoreResult<Self> {
        let fields = Fields::of("header", record)?;
        Ok(Self {
            height: fields.u64("height")?,
            id: fields.text("id")?,
            timestamp: fields.u64("timestamp")?,
            difficulty: fields.u64("difficulty")?,
            nonce: fields.u64("nonce")?,
            size: fields.u64("size")?,
            reward: fields.u64("reward")?,
            depth: fields.u64("depth")?,
            major_version: fields.u64("majorVersion")?,
            minor_version: fields.u64("minorVersion")?,
            prev_id: fields.text("prevId")?,
            num_txs: fields.u64("numTxs")?,
            orphan_status: fields.bool("orphanStatus")?,
            weight: fields.u64("weight")?,
            long_term_weight: fields.u64("longTermWeight")?,
            pow_hash: fields.text("powHash")?,
            miner_tx_id: fields.text("minerTxId")?,
        })
    }

    /// Sets the height.
    #[must_use]
    pub fn with_height(mut self, height: u64) -> Self {
        self.height = Some(height);
        self
    }

    /// Sets the block hash.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Folds `other` into this header.
    ///
    /// `depth` grows with the chain, so it takes the incoming value when
    /// present instead of being reconciled. The merge is all-or-nothing: on
    /// error this header is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Conflict`] if both headers hold different values
    /// for the same field.
    pub fn merge(&mut self, other: &Header) -> CoreResult<()> {
        let merged = self.merged(other)?;
        if merged != *self {
            debug!(height = ?merged.height, id = ?merged.id, "merged header");
        }
        *self = merged;
        Ok(())
    }

    fn merged(&self, other: &Header) -> CoreResult<Header> {
        Ok(reconcile_fields!(Header, self, other, {
            height,
            id,
            timestamp,
            difficulty,
            nonce,
            size,
            reward,
            major_version,
            minor_version,
            prev_id,
            num_txs,
            orphan_status,
            weight,
            long_term_weight,
            pow_hash,
            miner_tx_id,
        }, depth: other.depth.or(self.depth)))
    }

    pub(crate) fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        kv_line(f, "Height", self.height, indent)?;
        kv_line(f, "Id", self.id.as_deref(), indent)?;
        kv_line(f, "Timestamp", self.timestamp, indent)?;
        kv_line(f, "Difficulty", self.difficulty, indent)?;
        kv_line(f, "Nonce", self.nonce, indent)?;
        kv_line(f, "Size", self.size, indent)?;
        kv_line(f, "Reward", self.reward, indent)?;
        kv_line(f, "Depth", self.depth, indent)?;
        kv_line(f, "Major version", self.major_version, indent)?;
        kv_line(f, "Minor version", self.minor_version, indent)?;
        kv_line(f, "Previous id", self.prev_id.as_deref(), indent)?;
        kv_line(f, "Num txs", self.num_txs, indent)?;
        kv_line(f, "Orphan status", self.orphan_status, indent)?;
        kv_line(f, "Weight", self.weight, indent)?;
        kv_line(f, "Long term weight", self.long_term_weight, indent)?;
        kv_line(f, "PoW hash", self.pow_hash.as_deref(), indent)?;
        kv_line(f, "Miner tx id", self.miner_tx_id.as_deref(), indent)
    }
}

impl ToRecord for Header {
    fn to_record(&self) -> Value {
        RecordBuilder::new()
            .field("height", self.height)
            .field("id", self.id.clone())
            .field("timestamp", self.timestamp)
            .field("difficulty", self.difficulty)
            .field("nonce", self.nonce)
            .field("size", self.size)
            .field("reward", self.reward)
            .field("depth", self.depth)
            .field("majorVersion", self.major_version)
            .field("minorVersion", self.minor_version)
            .field("prevId", self.prev_id.clone())
            .field("numTxs", self.num_txs)
            .field("orphanStatus", self.orphan_status)
            .field("weight", self.weight)
            .field("longTermWeight", self.long_term_weight)
            .field("powHash", self.pow_hash.clone())
            .field("minerTxId", self.miner_tx_id.clone())
            .build()
    }
}

impl TryFrom<&Value> for Header {
    type Error = CoreError;

    fn try_from(record: &Value) -> CoreResult<Self> {
        Self::from_record(record)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaincache_codec::from_json;

    #[test]
    fn disjoint_headers_merge_all_fields() {
        let mut a = Header {
            height: Some(100),
            id: Some("aa".into()),
            ..Header::default()
        };
        let b = Header {
            timestamp: Some(1_700_000_000),
            difficulty: Some(42),
            ..Header::default()
        };
        a.merge(&b).unwrap();
        assert_eq!(a.height, Some(100));
        assert_eq!(a.id.as_deref(), Some("aa"));
        assert_eq!(a.timestamp, Some(1_700_000_000));
        assert_eq!(a.difficulty, Some(42));
    }

    #[test]
    fn conflicting_difficulty_leaves_both_unchanged() {
        let mut a = Header::new().with_height(7);
        a.difficulty = Some(100);
        a.nonce = None;
        let mut b = Header::new().with_height(7);
        b.difficulty = Some(200);
        b.nonce = Some(9);

        let before_a = a.clone();
        let before_b = b.clone();
        let err = a.merge(&b).unwrap_err();

        assert!(matches!(err, CoreError::Conflict { ref field, .. } if field == "difficulty"));
        assert_eq!(a, before_a);
        assert_eq!(b, before_b);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut a = Header::new().with_height(1);
        let x = Header::new().with_id("ff");
        a.merge(&x).unwrap();
        let once = a.clone();
        a.merge(&x).unwrap();
        assert_eq!(a, once);
    }

    #[test]
    fn depth_follows_the_latest_fetch() {
        let mut cached = Header::new().with_height(5).with_id("aa");
        cached.depth = Some(3);
        let mut refetched = cached.clone();
        refetched.depth = Some(4);

        cached.merge(&refetched).unwrap();
        assert_eq!(cached.depth, Some(4));
        cached.merge(&Header::new().with_height(5)).unwrap();
        assert_eq!(cached.depth, Some(4));
    }

    #[test]
    fn record_roundtrip_uses_camel_case() {
        let record = from_json(
            r#"{"height":5,"majorVersion":16,"prevId":"ab","orphanStatus":false,"unknown":1,"nonce":null}"#,
        )
        .unwrap();
        let header = Header::try_from(&record).unwrap();
        assert_eq!(header.major_version, Some(16));
        assert_eq!(header.prev_id.as_deref(), Some("ab"));
        assert_eq!(header.orphan_status, Some(false));
        assert_eq!(header.nonce, None);

        let out = header.to_record();
        assert_eq!(out.get("majorVersion"), Some(&Value::from(16u64)));
        assert!(out.get("unknown").is_none());
        assert!(out.get("nonce").is_none());
        assert_eq!(Header::from_record(&out).unwrap(), header);
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let record = from_json(r#"{"height":"tall"}"#).unwrap();
        assert!(matches!(
            Header::from_record(&record),
            Err(CoreError::InvalidArgument { .. })
        ));
        assert!(Header::from_record(&Value::from("x")).is_err());
    }

    #[test]
    fn display_lists_known_fields() {
        let header = Header::new().with_height(3).with_id("beef");
        let text = header.to_string();
        assert_eq!(text, "Height: 3\nId: beef\n");
    }
}
