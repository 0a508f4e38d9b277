//! Web asset embedding
//!
//! Walks the asset directory, compresses every file and writes a header with one byte array per
//! asset plus a `webResources` lookup table the firmware's web server iterates at startup.
//!
//! Only a missing asset directory is skipped. An asset that can't be read, a header that can't
//! be written or two assets claiming the same symbol fail the step: a partial table would serve
//! a web UI with silently missing files.

mod asset;
pub mod header;
pub mod mime;

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

pub use asset::{
    compress, is_html_template, substitute_version, symbol_name, FileAsset, VERSION_PLACEHOLDER,
};
pub use header::ResourceTableEntry;

use crate::version::Version;
use crate::Error;

/// Name of the generated header inside the include directory
pub const OUTPUT_FILE: &str = "web_resources.h";

/// The result of an embedding run
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum EmbedOutcome {
    /// The asset directory doesn't exist and nothing was written
    Skipped,
    /// The header was written to `path`
    Written {
        path: PathBuf,
        assets: usize,
        rows: usize,
    },
}

/// Reads and processes every file below `root`, in file name order at each directory level
///
/// Every asset claims two names in the generated header, its byte array and its length
/// constant. Returns `Error::SymbolCollision` if any name would be claimed twice.
pub fn collect_assets(root: &Path, version: &Version) -> Result<Vec<FileAsset>, Error> {
    let mut assets = Vec::new();
    let mut claimed: HashMap<String, String> = HashMap::new();

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative_path = relative_path(root, path);
        let raw = fs::read(path).map_err(Error::io(path))?;
        let asset = FileAsset::new(relative_path, raw, version).map_err(Error::io(path))?;
        let names = [asset.symbol().to_string(), asset.len_symbol()];

        for name in names.iter() {
            if let Some(existing) = claimed.get(name) {
                return Err(Error::SymbolCollision(
                    name.clone(),
                    existing.clone(),
                    asset.relative_path().to_string(),
                ));
            }
        }

        debug!(
            "Embedding {} as {} ({} -> {} -> {} bytes, {})",
            asset.relative_path(),
            asset.symbol(),
            asset.raw().len(),
            asset.processed().len(),
            asset.compressed().len(),
            asset.mime()
        );

        for name in names.iter() {
            claimed.insert(name.clone(), asset.relative_path().to_string());
        }
        assets.push(asset);
    }

    Ok(assets)
}

/// Generates [`OUTPUT_FILE`] in `include_dir` from the assets in `data_dir`
///
/// A missing `data_dir` is logged and skipped; any previous header is overwritten.
pub fn embed_web_files(
    data_dir: &Path,
    include_dir: &Path,
    version: &Version,
) -> Result<EmbedOutcome, Error> {
    if !data_dir.is_dir() {
        warn!(
            "[WebEmbedder] Error: {} directory not found!",
            data_dir.display()
        );

        return Ok(EmbedOutcome::Skipped);
    }

    let output = include_dir.join(OUTPUT_FILE);

    info!("[WebEmbedder] Generating {}...", output.display());

    let assets = collect_assets(data_dir, version)?;

    fs::create_dir_all(include_dir).map_err(Error::io(include_dir))?;

    let file = File::create(&output).map_err(Error::io(&output))?;
    let mut writer = BufWriter::new(file);

    header::write_to(&assets, &mut writer).map_err(Error::io(&output))?;
    writer.flush().map_err(Error::io(&output))?;

    let rows = header::table(&assets).len();

    info!(
        "[WebEmbedder] Successfully created {} ({} assets, {} routes)",
        output.display(),
        assets.len(),
        rows
    );

    Ok(EmbedOutcome::Written {
        path: output,
        assets: assets.len(),
        rows,
    })
}

/// `path` relative to `root`, with `/` as separator on every platform
fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);

    rel.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
