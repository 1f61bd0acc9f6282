/// This module provides the public entry points for reading and writing
/// property-list files.
///
/// Reading auto-detects the XML and old-style ASCII encodings and always
/// uses the crate's own parsers. Writing coerces the caller's value into
/// a dictionary tree, then serializes through the active backend: the
/// native encoder when one probed usable, the portable XML encoder
/// otherwise, with a silent per-write fallback between them.
///
use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::{
    coerce::coerce_dictionary,
    error::Error,
    formats::{AsciiFormat, PlistFormat, XmlFormat},
    native::{self, Backend},
    traits::{Parser, ToDictionary},
    types::Dictionary,
};

/// Reads a plist file into a dictionary.
///
/// Accepts both the XML and the old-style ASCII encodings. Fails with
/// [`Error::NotFound`] when the path does not exist, [`Error::Io`] when
/// it is empty or unreadable, and a parse or type error when the content
/// is not a plist of the allowed object kinds.
///
/// # Example
///
/// ```rust,no_run
/// let project = plistcodec::read_from_path("project.pbxproj")?;
/// assert!(project.contains_key("archiveVersion"));
/// # Ok::<(), plistcodec::Error>(())
/// ```
pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Dictionary, Error> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(Error::Io(io::Error::new(
            ErrorKind::NotFound,
            "no such file or directory - empty path",
        )));
    }
    if !path.exists() {
        return Err(Error::NotFound(path.display().to_string()));
    }

    let content = decode_file(path)?;
    read_from_str(&content)
}

/// Reads a plist from in-memory text, auto-detecting its encoding.
///
/// The top-level object must be a dictionary.
pub fn read_from_str(content: &str) -> Result<Dictionary, Error> {
    match PlistFormat::detect(content) {
        PlistFormat::Xml => XmlFormat::from_str(content)?.try_into(),
        PlistFormat::Ascii => AsciiFormat::from_str(content)?.try_into(),
    }
}

/// Writes a value as a plist file at `path`.
///
/// The value may be anything with a dictionary view (see
/// [`ToDictionary`]); map keys are coerced to strings, booleans to the
/// strings `"0"`/`"1"`, and integers beyond the signed 64-bit range to
/// their decimal strings. The file is committed atomically: a failed
/// write leaves no file, or leaves a prior file untouched.
///
/// # Example
///
/// ```rust,no_run
/// use std::collections::BTreeMap;
/// use plistcodec::Value;
///
/// let mut project = BTreeMap::new();
/// project.insert("archiveVersion".to_string(), Value::from("1.0"));
/// plistcodec::write_to_path(&project, "project.plist")?;
/// # Ok::<(), plistcodec::Error>(())
/// ```
pub fn write_to_path<T, P>(value: &T, path: P) -> Result<(), Error>
where
    T: ToDictionary + ?Sized,
    P: AsRef<Path>,
{
    write_to_path_with(value, path, Backend::current())
}

/// Like [`write_to_path`], but with an explicit backend instead of the
/// process-wide probed one. Passing [`Backend::Unusable`] forces the
/// portable XML encoder.
pub fn write_to_path_with<T, P>(value: &T, path: P, backend: &Backend) -> Result<(), Error>
where
    T: ToDictionary + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let path_str = path
        .to_str()
        .ok_or_else(|| Error::PathCoercion(format!("{:?} is not valid UTF-8", path)))?;
    if path_str.is_empty() {
        return Err(Error::Io(io::Error::new(
            ErrorKind::NotFound,
            "no such file or directory - empty destination path",
        )));
    }

    let dict = value.to_dictionary()?;
    let coerced = coerce_dictionary(&dict)?;

    // Serialize into a sibling temp file and rename it over the
    // destination, so a failed attempt never leaves truncated output.
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp = NamedTempFile::new_in(parent).map_err(Error::Io)?;
    native::write_with(backend, &coerced, temp.path())?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Reads a file to UTF-8 text, decoding a leading BOM if present.
fn decode_file(path: &Path) -> Result<String, Error> {
    let file = File::open(path).map_err(Error::Io)?;
    let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
        .bom_override(true)
        .build(file);

    let mut decoded = String::new();
    decoder.read_to_string(&mut decoded).map_err(Error::Io)?;
    Ok(decoded)
}
