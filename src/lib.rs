#![forbid(unsafe_code)]
//! Property list read/write toolkit for Rust.
//!
//! Reads and writes Apple property lists in the XML and old-style ASCII
//! (`.pbxproj`) encodings, with strict coercion into the allowed object
//! kinds: dictionary, array, string, boolean-as-string, and number.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use plistcodec::Value;
//!
//! let mut project = BTreeMap::new();
//! project.insert("archiveVersion".to_string(), Value::from("1.0"));
//!
//! plistcodec::write_to_path(&project, "project.plist")?;
//! let read_back = plistcodec::read_from_path("project.plist")?;
//! assert_eq!(read_back, project);
//! # Ok::<(), plistcodec::Error>(())
//! ```
//!
//! # Supported Encodings
//!
//! - **XML plist**: canonical Apple form, read and written byte-stably
//! - **ASCII plist**: the legacy `key = value;` form used by `.pbxproj`
//!   build descriptions and `.strings` tables
//!
//! # Writing
//!
//! Writes go through a native encoder (the host toolchain's `plutil`,
//! probed once per process) when one is available, and fall back
//! silently to the built-in XML encoder whenever it is not: a missing
//! or broken toolchain never surfaces as an error. Dates, binary data,
//! and every other plist object kind outside the allowed set are
//! rejected on both the read and the write side.

pub mod codec;
pub mod coerce;
pub mod error;
pub mod formats;
pub mod native;
pub mod traits;
pub mod types;

// Re-export most used types for easy consumption
pub use crate::{
    codec::{read_from_path, read_from_str, write_to_path, write_to_path_with},
    error::Error,
    formats::PlistFormat,
    native::{Backend, NativeEncoder},
    types::{Dictionary, Value},
};
