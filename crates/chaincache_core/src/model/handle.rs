//! Block instance handle.

use std::fmt;
use uuid::Uuid;

/// Identity of one in-memory `Block` instance.
///
/// A fresh handle is minted for every constructed block and for every
/// `Block::copy`; `Clone` keeps it, so a clone is a snapshot of the same
/// instance. Transactions hold it as a non-owning back-reference. Handles
/// carry no chain meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHandle(Uuid);

impl BlockHandle {
    /// Mints a new random handle.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
