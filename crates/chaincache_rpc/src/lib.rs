//! # ChainCache RPC
//!
//! Daemon transport for ChainCache.
//!
//! This crate provides:
//! - [`RpcClient`]: JSON-RPC and path requests with a shared rate limit
//! - [`HttpClient`]: the seam where an actual HTTP stack plugs in
//! - [`DaemonClient`]: typed calls returning partial entities
//! - [`CacheFiller`]: walks a height range and fills a [`BlockCache`]
//!
//! ## Contract
//!
//! - JSON-RPC calls post `{"jsonrpc":"2.0","id":"0","method","params"}` to
//!   `<endpoint>/json_rpc` and return the `result` member
//! - Path calls post the params to `<endpoint>/<path>` and return the whole
//!   response, decoding it twice if the daemon sent it as a string
//! - Any `error` member becomes [`RpcError::Fault`]
//! - Callers over the rate limit wait; they never fail for it
//!
//! [`BlockCache`]: chaincache_core::BlockCache

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod daemon;
mod error;
mod filler;
mod http;
mod throttle;

pub use client::RpcClient;
pub use config::{AuthMode, Credentials, RpcConfig, DEFAULT_MAX_REQUESTS_PER_SECOND, DEFAULT_PORT};
pub use daemon::DaemonClient;
pub use error::{RpcError, RpcResult, CODE_TOO_BIG_HEIGHT};
pub use filler::{CacheFiller, FillStats};
pub use http::{HttpClient, HttpRequest, MockHttpClient};
pub use throttle::Throttle;
