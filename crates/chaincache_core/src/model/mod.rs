//! Chain entities and their merge rules.
//!
//! A [`Block`] owns its [`Header`] and [`Transaction`]s; merges descend from
//! the block into the entities it owns, never the other way. Transactions
//! refer back to their block only through a [`BlockHandle`].

mod block;
mod handle;
mod header;
mod record;
mod transaction;

pub use block::Block;
pub use handle::BlockHandle;
pub use header::Header;
pub use transaction::{Transaction, TxInput, TxOutput};
