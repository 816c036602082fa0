//! Error types for ChainCache core.

use chaincache_codec::CodecError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in ChainCache core operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Malformed call into the marker or malformed input to entity construction.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of what was wrong with the argument.
        message: String,
    },

    /// Two merge inputs disagree on a field that must not change.
    #[error("conflicting values for {field}: {current} != {incoming}")]
    Conflict {
        /// Name of the disagreeing field.
        field: String,
        /// Value held by the merge target.
        current: String,
        /// Value carried by the merge source.
        incoming: String,
    },

    /// Attempted to merge two transactions with different ids.
    #[error("transaction identity mismatch: cannot merge {incoming} into {current}")]
    IdentityMismatch {
        /// Id of the merge target.
        current: String,
        /// Id of the merge source.
        incoming: String,
    },

    /// Record codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl CoreError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a conflict error from the two disagreeing values.
    pub fn conflict(
        field: impl Into<String>,
        current: &impl std::fmt::Debug,
        incoming: &impl std::fmt::Debug,
    ) -> Self {
        Self::Conflict {
            field: field.into(),
            current: format!("{current:?}"),
            incoming: format!("{incoming:?}"),
        }
    }

    /// Creates an identity mismatch error.
    pub fn identity_mismatch(current: impl Into<String>, incoming: impl Into<String>) -> Self {
        Self::IdentityMismatch {
            current: current.into(),
            incoming: incoming.into(),
        }
    }

    /// Returns true for errors raised by a merge (conflict or identity mismatch).
    pub fn is_merge_failure(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::IdentityMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_display_names_field_and_values() {
        let err = CoreError::conflict("difficulty", &Some(10u64), &Some(11u64));
        let text = err.to_string();
        assert!(text.contains("difficulty"));
        assert!(text.contains("10"));
        assert!(text.contains("11"));
        assert!(err.is_merge_failure());
    }

    #[test]
    fn invalid_argument_is_not_a_merge_failure() {
        let err = CoreError::invalid_argument("end 3 is before start 4");
        assert_eq!(err.to_string(), "invalid argument: end 3 is before start 4");
        assert!(!err.is_merge_failure());
    }

    #[test]
    fn codec_errors_convert() {
        let err: CoreError = CodecError::FloatForbidden.into();
        assert!(matches!(err, CoreError::Codec(CodecError::FloatForbidden)));
    }
}
