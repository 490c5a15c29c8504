//! `.tar.gz` extraction (linux and macOS releases).

use super::{create_dir_all_with_mode, ExtractError, DIR_MODE};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tar::Archive;

/// Decompresses `stream` and materializes every entry under `dest`, in archive order.
///
/// Directories are created with [`DIR_MODE`]; regular files are copied verbatim.
/// Any other entry type aborts the extraction.
pub fn extract_tar_gz<R: Read>(dest: &Path, stream: R) -> Result<(), ExtractError> {
    let decoder = GzDecoder::new(stream);
    if decoder.header().is_none() {
        return Err(ExtractError::Decompress(io::Error::new(
            io::ErrorKind::InvalidData,
            "missing or invalid gzip header",
        )));
    }

    let mut archive = Archive::new(decoder);
    let entries = archive.entries().map_err(ExtractError::Decompress)?;

    for entry in entries {
        let mut entry = entry.map_err(ExtractError::ReadEntry)?;
        let name = entry.path().map_err(ExtractError::ReadEntry)?.into_owned();
        let target = dest.join(&name);
        let kind = entry.header().entry_type();

        if kind.is_dir() {
            create_dir_all_with_mode(&target, DIR_MODE)
                .map_err(|e| ExtractError::write(&target, e))?;
        } else if kind.is_file() {
            let mut out = File::create(&target).map_err(|e| ExtractError::write(&target, e))?;
            io::copy(&mut entry, &mut out).map_err(|e| ExtractError::write(&target, e))?;
        } else {
            return Err(ExtractError::UnsupportedEntry {
                path: name,
                kind: format!("{:?}", kind),
            });
        }
        tracing::trace!(path = %target.display(), "extracted tar entry");
    }

    Ok(())
}
