//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while converting records to or from JSON text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The text is not valid JSON.
    #[error("malformed JSON: {message}")]
    MalformedJson {
        /// Parser diagnostic.
        message: String,
    },

    /// Failed to render a record as JSON text.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Floating point numbers have no place in chain records.
    #[error("float values are forbidden in records")]
    FloatForbidden,

    /// Integer does not fit the record integer range.
    #[error("integer overflow: {value}")]
    IntegerOverflow {
        /// The offending number as it appeared in the input.
        value: String,
    },

    /// Structurally valid JSON that does not have the expected shape.
    #[error("invalid record structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },
}

impl CodecError {
    /// Create a malformed JSON error.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::MalformedJson {
            message: message.into(),
        }
    }

    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed_json(err.to_string())
    }
}
