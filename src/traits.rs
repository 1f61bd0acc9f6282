//! Traits for format-agnostic parsing, serialization, and input coercion in plistcodec.

use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
    fs::File,
    hash::{BuildHasher, Hash},
    io::{BufRead, BufWriter, Cursor, Read, Write},
    path::Path,
};

use crate::{
    error::Error,
    types::{Dictionary, Value},
};

/// A trait for parsing and writing property lists from/to one file.
///
/// # Example
///
/// ```rust,no_run
/// use plistcodec::traits::Parser;
/// let format = plistcodec::formats::xml::Format::read_from("Info.plist")?;
/// format.write_to("Info_copy.plist")?;
/// Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait Parser {
    /// Parse from any reader.
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error>
    where
        Self: Sized;

    /// Parse from file path, decoding a leading BOM if present (plists in
    /// the wild, notably `.pbxproj` files, are sometimes UTF-16).
    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let file = File::open(path).map_err(Error::Io)?;
        // Auto-detect BOM, decode to UTF-8; passthrough UTF-8
        let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
            .bom_override(true)
            .build(file);

        let mut decoded = String::new();
        decoder.read_to_string(&mut decoded).map_err(Error::Io)?;

        Self::from_str(&decoded)
    }

    /// Write to any writer (file, memory, etc.).
    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error>;

    /// Write to file path.
    fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        self.to_writer(writer)
    }

    /// Parse from a string.
    fn from_str(s: &str) -> Result<Self, Error>
    where
        Self: Sized,
    {
        Self::from_reader(Cursor::new(s))
    }

    /// Parse from bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Error>
    where
        Self: Sized,
    {
        Self::from_reader(Cursor::new(bytes))
    }
}

/// A capability for producing a plist dictionary view of a value.
///
/// The write entry point accepts anything implementing this trait as its
/// root. Map keys are coerced through [`Display`], which can never fail,
/// so integer-keyed maps become string-keyed dictionaries.
pub trait ToDictionary {
    /// Produce a dictionary view of `self`, or fail with
    /// [`Error::ValueCoercion`] if no such view exists.
    fn to_dictionary(&self) -> Result<Dictionary, Error>;
}

impl<K, V> ToDictionary for BTreeMap<K, V>
where
    K: Display + Ord,
    V: Clone + Into<Value>,
{
    fn to_dictionary(&self) -> Result<Dictionary, Error> {
        Ok(self
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone().into()))
            .collect())
    }
}

impl<K, V, S> ToDictionary for HashMap<K, V, S>
where
    K: Display + Eq + Hash,
    V: Clone + Into<Value>,
    S: BuildHasher,
{
    fn to_dictionary(&self) -> Result<Dictionary, Error> {
        Ok(self
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone().into()))
            .collect())
    }
}

impl ToDictionary for Value {
    fn to_dictionary(&self) -> Result<Dictionary, Error> {
        match self {
            Value::Dictionary(dict) => Ok(dict.clone()),
            other => Err(Error::ValueCoercion(format!(
                "{} is not a dictionary",
                other.kind()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_keys_coerce_to_strings() {
        let mut map = BTreeMap::new();
        map.insert(1, "1");
        map.insert(2, "2");

        let dict = map.to_dictionary().unwrap();
        assert_eq!(dict.get("1"), Some(&Value::String("1".to_string())));
        assert_eq!(dict.get("2"), Some(&Value::String("2".to_string())));
    }

    #[test]
    fn test_hash_map_coerces() {
        let mut map = HashMap::new();
        map.insert("from".to_string(), "object");

        let dict = map.to_dictionary().unwrap();
        assert_eq!(dict.get("from"), Some(&Value::String("object".to_string())));
    }

    #[test]
    fn test_dictionary_value_passes_through() {
        let mut dict = Dictionary::new();
        dict.insert("key".to_string(), Value::from("value"));
        let value = Value::Dictionary(dict.clone());

        assert_eq!(value.to_dictionary().unwrap(), dict);
    }

    #[test]
    fn test_non_dictionary_value_is_rejected() {
        let value = Value::Array(vec![Value::from("loose")]);
        let err = value.to_dictionary().unwrap_err();
        assert!(err.is_type_error());
        assert!(err.to_string().contains("array"));
    }
}
