//! Native serialization backend with silent XML fallback.
//!
//! The writer prefers the host toolchain's own plist encoder (`plutil`,
//! located through `xcrun`) when one is installed, probing for it once
//! per process. Every failure mode (a missing toolchain, a license
//! prompt where a path should be, a dead binary, a value the native
//! encoder cannot take, a failing conversion) collapses to the portable
//! XML encoder without surfacing an error. Skipping the native path
//! entirely is always a correct configuration.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use crate::{
    error::Error,
    formats::XmlFormat,
    traits::Parser,
    types::{Dictionary, Value},
};

/// Set this environment variable to any value to keep the native encoder
/// out of the picture for the whole process.
pub const NO_NATIVE_ENV: &str = "PLISTCODEC_NO_NATIVE";

/// The probed state of the native encoder.
///
/// Resolved at most once per process; once `Unusable`, it stays that way
/// (no re-probe). An explicit value can be passed to
/// [`crate::write_to_path_with`] to bypass the cached verdict, which is
/// how the fallback paths are tested.
#[derive(Debug, Clone)]
pub enum Backend {
    Usable(NativeEncoder),
    Unusable,
}

impl Backend {
    /// The process-wide backend, probing on first use. Racing callers are
    /// safe: the first completed probe's verdict wins.
    pub fn current() -> &'static Backend {
        static STATE: OnceLock<Backend> = OnceLock::new();
        STATE.get_or_init(probe)
    }
}

/// Handle to a resolved native encoder binary.
#[derive(Debug, Clone)]
pub struct NativeEncoder {
    tool: PathBuf,
}

impl NativeEncoder {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        NativeEncoder { tool: tool.into() }
    }

    /// One native write attempt. Any failure is recoverable: the caller
    /// falls back to the XML encoder.
    fn encode(&self, root: &Dictionary, destination: &Path) -> Result<(), NativeFailure> {
        // Non-finite reals have no representation on the JSON bridge.
        if root.values().any(has_non_finite_real) {
            return Err(NativeFailure);
        }
        let json = serde_json::to_vec(root).map_err(|_| NativeFailure)?;

        let mut child = Command::new(&self.tool)
            .args(["-convert", "xml1", "-", "-o"])
            .arg(destination)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|_| NativeFailure)?;

        let outcome = child
            .stdin
            .take()
            .ok_or(NativeFailure)
            .and_then(|mut stdin| stdin.write_all(&json).map_err(|_| NativeFailure));
        let status = child.wait().map_err(|_| NativeFailure)?;

        outcome?;
        if status.success() {
            Ok(())
        } else {
            Err(NativeFailure)
        }
    }
}

/// Marker for a failed native write attempt. Never escapes this module.
#[derive(Debug)]
struct NativeFailure;

/// Writes `root` to `destination` through the given backend, falling back
/// to the XML encoder on any native failure. The fallback is invisible to
/// the caller: the write succeeds and the file reparses equal.
pub(crate) fn write_with(
    backend: &Backend,
    root: &Dictionary,
    destination: &Path,
) -> Result<(), Error> {
    if let Backend::Usable(encoder) = backend {
        if encoder.encode(root, destination).is_ok() {
            return Ok(());
        }
    }
    XmlFormat::from(root.clone()).write_to(destination)
}

/// Resolves the native encoder, collapsing to `Unusable` on the first
/// failed step: policy opt-out, locator failure, a non-path locator
/// response, or a dead binary.
fn probe() -> Backend {
    if std::env::var_os(NO_NATIVE_ENV).is_some() {
        return Backend::Unusable;
    }

    let output = match Command::new("xcrun").args(["--find", "plutil"]).output() {
        Ok(output) if output.status.success() => output,
        _ => return Backend::Unusable,
    };

    let located = String::from_utf8_lossy(&output.stdout);
    let located = located.trim();
    if !is_tool_path(located) {
        return Backend::Unusable;
    }

    let tool = PathBuf::from(located);
    if !tool.is_file() {
        return Backend::Unusable;
    }

    // The binary must actually answer before we trust it.
    match Command::new(&tool)
        .arg("-help")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) if status.success() => Backend::Usable(NativeEncoder::new(tool)),
        _ => Backend::Unusable,
    }
}

/// A locator response counts as a path only if it is one nonblank line
/// starting at the filesystem root. License prompts and other error
/// messages printed in place of a path fail this.
fn is_tool_path(located: &str) -> bool {
    !located.is_empty() && located.starts_with('/') && !located.contains('\n')
}

fn has_non_finite_real(value: &Value) -> bool {
    match value {
        Value::Real(r) => !r.is_finite(),
        Value::Dictionary(dict) => dict.values().any(has_non_finite_real),
        Value::Array(items) => items.iter().any(has_non_finite_real),
        _ => false,
    }
}
