//! Extension to MIME type lookup for embedded assets
//!
//! The types carry no charset parameter: the firmware compares them literally when deciding on
//! response headers.

use std::path::Path;

pub mod types {
    pub const HTML: &str = "text/html";
    pub const CSS: &str = "text/css";
    pub const JAVASCRIPT: &str = "application/javascript";
    pub const JSON: &str = "application/json";
    pub const PLAIN: &str = "text/plain";
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/x-icon";
    pub const WEBP: &str = "image/webp";
    pub const WOFF2: &str = "font/woff2";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}

/// Guess the MIME type of `path` from its extension
pub fn from_path(path: &Path) -> &'static str {
    from_extension(path.extension().and_then(|ext| ext.to_str()))
}

/// Guess the MIME type from an extension without the leading dot, ignoring case
pub fn from_extension(ext: Option<&str>) -> &'static str {
    let ext = match ext {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return types::OCTET_STREAM,
    };

    match ext.as_str() {
        "html" | "htm" => types::HTML,
        "css" => types::CSS,
        "js" => types::JAVASCRIPT,
        "json" => types::JSON,
        "txt" => types::PLAIN,
        "png" => types::PNG,
        "jpg" | "jpeg" => types::JPEG,
        "gif" => types::GIF,
        "svg" => types::SVG,
        "ico" => types::ICO,
        "webp" => types::WEBP,
        "woff2" => types::WOFF2,
        _ => types::OCTET_STREAM,
    }
}
