use std::borrow::Cow;
use std::io::{self, Write};
use std::path::Path;

use flate2::{Compression, GzBuilder};
use log::warn;

use super::mime;
use crate::version::Version;

/// Token in HTML templates that is replaced with the URL-encoded version
pub const VERSION_PLACEHOLDER: &str = "%APP_VERSION%";

/// Prefix of every generated storage symbol
const SYMBOL_PREFIX: &str = "PAGE_";

/// A single static file under the asset root, ready to be embedded
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FileAsset {
    /// Slash separated path relative to the asset root
    relative_path: String,
    mime: &'static str,
    raw: Vec<u8>,
    /// `raw` after version substitution
    processed: Vec<u8>,
    /// gzip of `processed`
    compressed: Vec<u8>,
    symbol: String,
}

impl FileAsset {
    /// Processes the contents `raw` of the file at `relative_path`
    ///
    /// HTML templates get their version placeholders substituted before the content is
    /// compressed.
    pub fn new<S: Into<String>>(
        relative_path: S,
        raw: Vec<u8>,
        version: &Version,
    ) -> io::Result<FileAsset> {
        let relative_path = relative_path.into();
        let path = Path::new(&relative_path);
        let mime = mime::from_path(path);

        let processed = if is_html_template(path) {
            substitute_version(&raw, version).into_owned()
        } else {
            raw.clone()
        };

        let compressed = compress(&processed)?;
        let symbol = symbol_name(&relative_path);

        Ok(FileAsset {
            relative_path,
            mime,
            raw,
            processed,
            compressed,
            symbol,
        })
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// The URL the asset is served at
    pub fn route(&self) -> String {
        format!("/{}", self.relative_path)
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn processed(&self) -> &[u8] {
        &self.processed
    }

    pub fn compressed(&self) -> &[u8] {
        &self.compressed
    }

    /// Name of the generated byte array
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Name of the generated length constant
    pub fn len_symbol(&self) -> String {
        format!("{}_LEN", self.symbol)
    }
}

/// Derives the storage symbol for an asset, e.g. `css/app-dark.css` -> `PAGE_CSS_APP_DARK_CSS`
///
/// Path separators, dots, hyphens and any other character that can't appear in a C identifier
/// become underscores.
pub fn symbol_name(relative_path: &str) -> String {
    let body: String = relative_path
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();

    format!("{}{}", SYMBOL_PREFIX, body)
}

pub fn is_html_template(path: &Path) -> bool {
    mime::from_path(path) == mime::types::HTML
}

/// Replaces every occurrence of [`VERSION_PLACEHOLDER`] in `content` with the URL-encoded
/// version
///
/// Content that isn't valid UTF-8 is returned unchanged.
pub fn substitute_version<'a>(content: &'a [u8], version: &Version) -> Cow<'a, [u8]> {
    let text = match std::str::from_utf8(content) {
        Ok(text) => text,
        Err(err) => {
            warn!("Skipping version substitution in non UTF-8 template: {}", err);
            return Cow::Borrowed(content);
        }
    };

    if !text.contains(VERSION_PLACEHOLDER) {
        return Cow::Borrowed(content);
    }

    Cow::Owned(
        text.replace(VERSION_PLACEHOLDER, &version.url_encoded())
            .into_bytes(),
    )
}

/// gzip-compresses `bytes` at the best compression level
///
/// The header carries no file name and a zero timestamp, so equal input always yields equal
/// output.
pub fn compress(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzBuilder::new()
        .mtime(0)
        .write(Vec::with_capacity(bytes.len() / 2 + 32), Compression::best());

    encoder.write_all(bytes)?;
    encoder.finish()
}
