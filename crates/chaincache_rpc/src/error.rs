//! Error types for the RPC client.

use chaincache_codec::CodecError;
use chaincache_core::CoreError;
use thiserror::Error;

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// Daemon fault code for a height past the chain tip.
pub const CODE_TOO_BIG_HEIGHT: i64 = -2;

/// Errors that can occur while talking to a daemon.
#[derive(Error, Debug)]
pub enum RpcError {
    /// The daemon answered with an error member.
    #[error("rpc fault {code}: {message}")]
    Fault {
        /// Daemon error code.
        code: i64,
        /// Daemon error message.
        message: String,
    },

    /// The daemon answered with a status other than OK.
    #[error("daemon status: {0}")]
    Status(String),

    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The response did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The client was closed.
    #[error("not connected to daemon")]
    NotConnected,

    /// Response or request body could not be coded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Fetched data could not be turned into entities or merged.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl RpcError {
    /// Creates a fault error.
    pub fn fault(code: i64, message: impl Into<String>) -> Self {
        Self::Fault {
            code,
            message: message.into(),
        }
    }

    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RpcError::Transport { retryable: true, .. })
    }

    /// Returns true if the daemon reported that the requested data does not
    /// exist (yet).
    pub fn is_not_found(&self) -> bool {
        matches!(self, RpcError::Fault { code, .. } if *code == CODE_TOO_BIG_HEIGHT)
    }
}
