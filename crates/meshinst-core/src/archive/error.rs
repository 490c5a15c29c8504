//! Extraction error type.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while unpacking a release archive. Identifies the step that failed.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The compressed stream could not be decoded or the archive could not be opened.
    #[error("decompress archive: {0}")]
    Decompress(#[source] io::Error),
    /// The zip container itself is unreadable.
    #[error("open zip archive: {0}")]
    Zip(#[source] ::zip::result::ZipError),
    /// Reading the next entry (header or contents) failed.
    #[error("read archive entry: {0}")]
    ReadEntry(#[source] io::Error),
    /// Creating or writing the destination of an entry failed.
    #[error("write {}: {source}", path.display())]
    WriteEntry {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Entry is neither a directory nor a regular file (symlink, device, ...).
    #[error("unsupported entry type {kind} for {}", path.display())]
    UnsupportedEntry { path: PathBuf, kind: String },
}

impl ExtractError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ExtractError::WriteEntry {
            path: path.into(),
            source,
        }
    }
}
