//! Version resolution
//!
//! The version is read once per build from a single-line `version` file in the project root
//! and handed to the other stages in the representations they need: the raw string for the
//! `APP_VERSION` define, a filename-safe form for release artifacts, and a URL-safe form for
//! substitution into web templates.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use log::{info, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::defines::Defines;

/// Prefix shared by the program name and every release artifact
pub const PRODUCT_PREFIX: &str = "Hyperk";

/// Name of the version marker file in the project root
pub const VERSION_FILE: &str = "version";

/// Name of the preprocessor define carrying the version
pub const VERSION_DEFINE: &str = "APP_VERSION";

/// Used when the project has no version marker file
pub const UNKNOWN_VERSION: &str = "0.0.0-unknown";

/// Used by the embedder when the version define is missing or can't be parsed
pub const DEFAULT_VERSION: &str = "1.0.0";

/// RFC 3986 unreserved characters are left as-is
const URL_UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Version(String);

impl Version {
    pub fn new<S: Into<String>>(raw: S) -> Version {
        Version(raw.into())
    }

    /// Reads the version marker file in `project_dir`
    ///
    /// A missing, unreadable or empty file is not an error: the version falls back to
    /// [`UNKNOWN_VERSION`].
    pub fn resolve<P: AsRef<Path>>(project_dir: P) -> Version {
        let path = project_dir.as_ref().join(VERSION_FILE);

        let version = match fs::read_to_string(&path) {
            Ok(contents) if !contents.trim().is_empty() => Version::new(contents.trim()),
            Ok(_) => {
                warn!("Version file {} is empty", path.display());
                Version::new(UNKNOWN_VERSION)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("No version file at {}", path.display());
                Version::new(UNKNOWN_VERSION)
            }
            Err(err) => {
                warn!("Could not read version file {}: {}", path.display(), err);
                Version::new(UNKNOWN_VERSION)
            }
        };

        info!(">>> Detected Project Version: {}", version);

        version
    }

    /// Recovers the version from a previously injected `APP_VERSION` define
    ///
    /// Returns `None` when the define is absent or has an empty value.
    pub fn from_defines(defines: &Defines) -> Option<Version> {
        let value = defines.value(VERSION_DEFINE)?;
        let unquoted = strip_quotes(value);
        let raw = unescape(unquoted);

        if raw.trim().is_empty() {
            None
        } else {
            Some(Version::new(raw.trim()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The version with everything but ASCII alphanumerics, `.` and `-` removed
    pub fn sanitized(&self) -> String {
        self.0
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
            .collect()
    }

    /// The version percent-encoded for use inside a URL
    pub fn url_encoded(&self) -> String {
        utf8_percent_encode(&self.0, URL_UNRESERVED).to_string()
    }

    /// The `APP_VERSION` define with the value quoted as a C string literal
    pub fn define(&self) -> String {
        format!("{}=\\\"{}\\\"", VERSION_DEFINE, escape(&self.0))
    }

    /// The define as a compiler flag, ready to be appended to the build flags
    pub fn build_flag(&self) -> String {
        format!("-D{}", self.define())
    }

    /// The program name the linked binary is given, e.g. `Hyperk_2.3.1`
    pub fn program_name(&self) -> String {
        format!("{}_{}", PRODUCT_PREFIX, self.0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

fn unescape(value: &str) -> String {
    value.replace("\\\"", "\"").replace("\\\\", "\\")
}

/// Strips one layer of escaped (`\"`) or plain (`"`) quotes
fn strip_quotes(value: &str) -> &str {
    for quote in ["\\\"", "\""].iter().copied() {
        if value.len() >= 2 * quote.len() && value.starts_with(quote) && value.ends_with(quote) {
            return &value[quote.len()..value.len() - quote.len()];
        }
    }

    value
}
