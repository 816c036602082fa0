//! # ChainCache Codec
//!
//! Loosely-typed records for ChainCache.
//!
//! This crate provides:
//! - [`Value`], the dynamic shape of partial chain data before it is upgraded
//!   into typed entities, and of canonical records after serialization
//! - JSON text conversion (daemon responses in, snapshots out)
//!
//! ## Record Rules
//!
//! - Map keys are text and kept sorted
//! - Integers span the `i64` and `u64` ranges
//! - No floats
//!
//! ## Usage
//!
//! ```
//! use chaincache_codec::{from_json, to_json, Value};
//!
//! let value = from_json(r#"{"height": 42, "id": "ab"}"#).unwrap();
//! assert_eq!(value.get("height"), Some(&Value::Integer(42)));
//! assert_eq!(to_json(&value).unwrap(), r#"{"height":42,"id":"ab"}"#);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod json;
mod value;

pub use error::{CodecError, CodecResult};
pub use json::{from_json, from_json_slice, to_json, to_json_pretty};
pub use value::Value;

/// Types that serialize into a plain nested record.
pub trait ToRecord {
    /// Serialize into a record, recursively serializing owned sub-entities.
    fn to_record(&self) -> Value;

    /// Serialize into compact JSON text.
    fn to_json(&self) -> CodecResult<String> {
        to_json(&self.to_record())
    }
}

impl ToRecord for Value {
    fn to_record(&self) -> Value {
        self.clone()
    }
}
