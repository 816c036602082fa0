//! # ChainCache Testkit
//!
//! Test utilities for ChainCache.
//!
//! This crate provides:
//! - Property-based test generators using proptest
//! - A reference model of the range marker
//! - Sample entities and a simulated daemon chain
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chaincache_testkit::prelude::*;
//!
//! let chain = FakeChain::new(10, 2);
//! let body = chain.respond("http://node/json_rpc", br#"{"method":"get_block_count"}"#)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod model;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::model::*;
}

pub use fixtures::*;
pub use generators::*;
pub use model::*;
