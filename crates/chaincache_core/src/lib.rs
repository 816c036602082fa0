//! # ChainCache Core
//!
//! Client-side reconciliation of partial blockchain data.
//!
//! This crate provides:
//! - [`RangeMarker`], a compact invertible set of marked indices over `u64`
//! - [`reconcile`](reconcile::reconcile), the field combinator behind every merge
//! - [`Header`], [`Transaction`] and [`Block`] entities with atomic,
//!   idempotent `merge` operations
//! - [`BlockCache`], a lock-guarded owner of canonical blocks by height
//!
//! ## Merge Rules
//!
//! - An absent field takes the other side's value
//! - Two present scalars must be equal, otherwise the merge fails with
//!   [`CoreError::Conflict`] and nothing changes
//! - Two present lists are unioned in first-seen order
//! - Transactions inside a block are matched by id
//!
//! ## Usage
//!
//! ```
//! use chaincache_core::{Header, MarkState, RangeMarker};
//!
//! let mut synced = RangeMarker::new();
//! synced.mark(0..=99).unwrap();
//! assert_eq!(synced.is_marked(50..=150).unwrap(), MarkState::Mixed);
//! assert_eq!(synced.get_first(false, 0, None).unwrap(), Some(100));
//!
//! let mut header = Header::new().with_height(100);
//! header.merge(&Header::new().with_id("ab12")).unwrap();
//! assert_eq!(header.id.as_deref(), Some("ab12"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod error;
pub mod marker;
mod model;
pub mod reconcile;

pub use cache::BlockCache;
pub use error::{CoreError, CoreResult};
pub use marker::{IndexRange, MarkState, MarkerState, RangeMarker, Selection};
pub use model::{Block, BlockHandle, Header, Transaction, TxInput, TxOutput};

pub use chaincache_codec::{ToRecord, Value};
