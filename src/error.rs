//! All error types for the plistcodec crate.
//!
//! These are returned from all fallible operations (reading, writing, coercion, etc.).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The source path does not exist. Kept separate from [`Error::Io`] so
    /// callers can surface a clear operational message instead of a raw
    /// I/O failure.
    #[error("file not found: `{0}`")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("malformed plist: {0}")]
    Malformed(String),

    /// A plist object kind outside {dictionary, array, string, boolean,
    /// number} was encountered, on either the read or the write side.
    #[error("unsupported object type: {0}")]
    UnsupportedType(String),

    /// A value survived type checks but cannot be represented in the
    /// target text encoding.
    #[error("could not convert value: {0}")]
    CannotRepresent(String),

    /// The root value offered to the writer has no dictionary view.
    #[error("cannot coerce value to a dictionary: {0}")]
    ValueCoercion(String),

    /// The destination path has no string representation.
    #[error("cannot coerce path to a string: {0}")]
    PathCoercion(String),
}

impl Error {
    /// Creates a new malformed-content error
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::Malformed(message.into())
    }

    /// Creates a new unsupported-object-type error
    pub fn unsupported_type(kind: impl Into<String>) -> Self {
        Error::UnsupportedType(kind.into())
    }

    /// Whether this is a type/coercion failure, as opposed to an I/O or
    /// parse failure. These correspond to `TypeError` in the plist
    /// reference implementations.
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedType(_)
                | Error::CannotRepresent(_)
                | Error::ValueCoercion(_)
                | Error::PathCoercion(_)
        )
    }
}
