use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {}: {}", _0.display(), _1)]
    Io(PathBuf, #[source] io::Error),

    #[error("Could not walk asset directory: {}", _0)]
    Walk(#[from] walkdir::Error),

    #[error("Assets {:?} and {:?} both map to the symbol {}", _1, _2, _0)]
    SymbolCollision(String, String, String),

    #[error("Missing build setting: {}", _0)]
    MissingSetting(&'static str),

    #[error("Could not launch merge tool for target {}: {}", _0, _1)]
    MergeLaunch(String, #[source] io::Error),

    #[error("Merge tool failed for target {} (exit code {:?})", _0, _1)]
    MergeFailed(String, Option<i32>),
}

impl Error {
    /// Returns a closure that wraps an `io::Error` together with the `path` it concerns
    pub(crate) fn io<P: Into<PathBuf>>(path: P) -> impl FnOnce(io::Error) -> Error {
        let path = path.into();

        move |err| Error::Io(path, err)
    }
}
