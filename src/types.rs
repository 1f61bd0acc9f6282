//! Core plist value types for plistcodec.
//! Parsers decode into these; encoders serialize these.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A plist dictionary: a string-keyed mapping with unique keys.
///
/// Backed by a `BTreeMap` so iteration order, and therefore serialized
/// output, is deterministic for a given tree.
pub type Dictionary = BTreeMap<String, Value>;

/// A single plist value.
///
/// Only these variants are valid at any depth, in either direction:
/// anything else found while reading (a date, binary data) or offered
/// while writing is a hard error, never silently dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    /// Booleans are serialized as the literal strings `"0"`/`"1"`, never
    /// as a native boolean token, so a written boolean reads back as a
    /// string.
    Boolean(bool),
    /// Wide enough to carry integers beyond the native 64-bit encoder
    /// range; those are coerced to decimal strings on write.
    Integer(i128),
    Real(f64),
    Dictionary(Dictionary),
    Array(Vec<Value>),
}

impl Value {
    /// Human-readable kind name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Dictionary(_) => "dictionary",
            Value::Array(_) => "array",
        }
    }

    /// Returns the inner dictionary, if this is a dictionary.
    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// Returns the inner string, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value as i128)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Integer(value as i128)
    }
}

impl From<i128> for Value {
    fn from(value: i128) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl From<Dictionary> for Value {
    fn from(value: Dictionary) -> Self {
        Value::Dictionary(value)
    }
}

/// JSON view of a value tree, used as the bridge into the native encoder.
/// Booleans and numbers keep their natural JSON forms here; the plist
/// "0"/"1" convention is applied by coercion before any encoder runs.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i128(*i),
            Value::Real(r) => serializer.serialize_f64(*r),
            Value::Dictionary(dict) => {
                let mut map = serializer.serialize_map(Some(dict.len()))?;
                for (key, value) in dict {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}
