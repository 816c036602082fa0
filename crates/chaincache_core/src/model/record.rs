//! Reading and writing entity fields from loosely-typed records.

use crate::error::{CoreError, CoreResult};
use chaincache_codec::{ToRecord, Value};
use std::fmt;

/// Typed field access over a map record.
///
/// Missing keys and explicit nulls both read as `None`; a present key with
/// the wrong kind of value is an invalid argument.
pub(crate) struct Fields<'a> {
    entity: &'static str,
    record: &'a Value,
}

impl<'a> Fields<'a> {
    /// Wraps `record`, which must be a map.
    pub(crate) fn of(entity: &'static str, record: &'a Value) -> CoreResult<Self> {
        if !record.is_map() {
            return Err(CoreError::invalid_argument(format!(
                "{entity} record must be a map, got {}",
                record.kind()
            )));
        }
        Ok(Self { entity, record })
    }

    /// Raw value of `key`, with null treated as absent.
    pub(crate) fn raw(&self, key: &str) -> Option<&'a Value> {
        self.record.get(key).filter(|v| !v.is_null())
    }

    fn wrong_kind(&self, key: &str, expected: &str, found: &Value) -> CoreError {
        CoreError::invalid_argument(format!(
            "{}.{key} must be {expected}, got {}",
            self.entity,
            found.kind()
        ))
    }

    pub(crate) fn u64(&self, key: &str) -> CoreResult<Option<u64>> {
        self.raw(key)
            .map(|v| v.as_u64().ok_or_else(|| self.wrong_kind(key, "an unsigned integer", v)))
            .transpose()
    }

    pub(crate) fn bool(&self, key: &str) -> CoreResult<Option<bool>> {
        self.raw(key)
            .map(|v| v.as_bool().ok_or_else(|| self.wrong_kind(key, "a bool", v)))
            .transpose()
    }

    pub(crate) fn text(&self, key: &str) -> CoreResult<Option<String>> {
        self.raw(key)
            .map(|v| {
                v.as_text()
                    .map(str::to_string)
                    .ok_or_else(|| self.wrong_kind(key, "text", v))
            })
            .transpose()
    }

    /// Reads an array, converting each element with `item`.
    pub(crate) fn list<T>(
        &self,
        key: &str,
        item: impl Fn(&Value) -> CoreResult<T>,
    ) -> CoreResult<Option<Vec<T>>> {
        self.raw(key)
            .map(|v| {
                v.as_array()
                    .ok_or_else(|| self.wrong_kind(key, "an array", v))?
                    .iter()
                    .map(&item)
                    .collect::<CoreResult<Vec<T>>>()
            })
            .transpose()
    }

    pub(crate) fn text_list(&self, key: &str) -> CoreResult<Option<Vec<String>>> {
        self.list(key, |v| {
            v.as_text()
                .map(str::to_string)
                .ok_or_else(|| self.wrong_kind(key, "an array of text", v))
        })
    }

    pub(crate) fn u64_list(&self, key: &str) -> CoreResult<Option<Vec<u64>>> {
        self.list(key, |v| {
            v.as_u64()
                .ok_or_else(|| self.wrong_kind(key, "an array of unsigned integers", v))
        })
    }
}

/// Builds a map record, skipping absent fields.
#[derive(Default)]
pub(crate) struct RecordBuilder {
    pairs: Vec<(String, Value)>,
}

impl RecordBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn field<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.pairs.push((key.to_string(), value.into()));
        }
        self
    }

    pub(crate) fn build(self) -> Value {
        Value::map(self.pairs)
    }
}

/// Converts a list of entities into an array of records.
pub(crate) fn records<T: ToRecord>(items: &[T]) -> Value {
    Value::Array(items.iter().map(ToRecord::to_record).collect())
}

/// Writes one indented `key: value` line, skipping absent values.
pub(crate) fn kv_line<V: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    key: &str,
    value: Option<V>,
    indent: usize,
) -> fmt::Result {
    match value {
        Some(value) => writeln!(f, "{:width$}{key}: {value}", "", width = indent * 2),
        None => Ok(()),
    }
}

/// Writes an indented section heading.
pub(crate) fn heading(f: &mut fmt::Formatter<'_>, title: &str, indent: usize) -> fmt::Result {
    writeln!(f, "{:width$}{title}:", "", width = indent * 2)
}

/// Renders a list as comma-separated values.
pub(crate) fn joined<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        Value::map(vec![
            ("height".to_string(), Value::from(12u64)),
            ("id".to_string(), Value::from("abc")),
            ("orphan".to_string(), Value::Bool(false)),
            ("gone".to_string(), Value::Null),
            ("ids".to_string(), Value::from(vec!["a", "b"])),
        ])
    }

    #[test]
    fn reads_typed_fields() {
        let record = sample();
        let fields = Fields::of("header", &record).unwrap();
        assert_eq!(fields.u64("height").unwrap(), Some(12));
        assert_eq!(fields.text("id").unwrap(), Some("abc".into()));
        assert_eq!(fields.bool("orphan").unwrap(), Some(false));
        assert_eq!(fields.u64("gone").unwrap(), None);
        assert_eq!(fields.u64("missing").unwrap(), None);
        assert_eq!(
            fields.text_list("ids").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn wrong_kind_is_invalid_argument() {
        let record = sample();
        let fields = Fields::of("header", &record).unwrap();
        let err = fields.u64("id").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid argument: header.id must be an unsigned integer, got text"
        );
        assert!(fields.u64_list("ids").is_err());
    }

    #[test]
    fn non_map_record_is_rejected() {
        assert!(matches!(
            Fields::of("block", &Value::from(3u64)),
            Err(CoreError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn builder_skips_absent_fields() {
        let record = RecordBuilder::new()
            .field("b", Some(2u64))
            .field::<u64>("a", None)
            .field("c", Some("x"))
            .build();
        assert_eq!(
            record,
            Value::map(vec![
                ("b".to_string(), Value::from(2u64)),
                ("c".to_string(), Value::from("x")),
            ])
        );
    }
}
