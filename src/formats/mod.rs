//! All supported property-list text encodings for plistcodec.
//!
//! This module re-exports the main types for each encoding and provides
//! the [`PlistFormat`] enum for generic format handling across the crate.

pub mod ascii;
pub mod xml;

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

// Reexporting the formats for easier access
pub use ascii::Format as AsciiFormat;
pub use xml::Format as XmlFormat;

use crate::Error;

/// Represents the supported plist text encodings for generic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlistFormat {
    /// Apple XML plist (`<?xml ...?>` + `<plist version="1.0">`).
    Xml,
    /// Old-style ASCII plist (`key = value;`, brace-delimited), as used
    /// by `.pbxproj` build descriptions.
    Ascii,
}

impl PlistFormat {
    /// Detects the encoding of plist text by inspecting its leading,
    /// whitespace-trimmed content. Anything that does not open with an
    /// XML declaration or a `<plist` tag is treated as old-style ASCII.
    pub fn detect(content: &str) -> Self {
        let trimmed = content.trim_start();
        if trimmed.starts_with("<?xml") || trimmed.starts_with("<plist") {
            PlistFormat::Xml
        } else {
            PlistFormat::Ascii
        }
    }

    /// Returns the typical file extension for this encoding.
    pub fn extension(&self) -> &'static str {
        match self {
            PlistFormat::Xml => "plist",
            PlistFormat::Ascii => "pbxproj",
        }
    }
}

impl Display for PlistFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PlistFormat::Xml => write!(f, "xml"),
            PlistFormat::Ascii => write!(f, "ascii"),
        }
    }
}

/// Accepts `"xml"`/`"xml1"` and `"ascii"`/`"openstep"`, case-insensitive.
///
/// Returns [`crate::error::Error::Malformed`] for unknown strings.
impl FromStr for PlistFormat {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "xml" | "xml1" => Ok(PlistFormat::Xml),
            "ascii" | "openstep" => Ok(PlistFormat::Ascii),
            other => Err(Error::Malformed(format!("unknown plist format `{other}`"))),
        }
    }
}
