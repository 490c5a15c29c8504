//! `.zip` extraction (windows releases).

use super::{create_dir_all_with_mode, ExtractError};
use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read};
use std::path::Path;

/// Mode used when an entry carries no unix permissions.
const DEFAULT_FILE_MODE: u32 = 0o644;
const DEFAULT_DIR_MODE: u32 = 0o755;

/// Buffers `stream` in memory (zip needs random access), then materializes
/// every entry under `dest` using the entry's own mode bits.
///
/// Release zips are tens of megabytes, so holding one in memory is fine.
pub fn extract_zip<R: Read>(dest: &Path, mut stream: R) -> Result<(), ExtractError> {
    let mut zipped = Vec::new();
    stream
        .read_to_end(&mut zipped)
        .map_err(ExtractError::Decompress)?;

    let mut archive = ::zip::ZipArchive::new(Cursor::new(zipped)).map_err(ExtractError::Zip)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(ExtractError::Zip)?;
        let target = dest.join(file.name());

        if file.is_dir() {
            let mode = permission_bits(file.unix_mode(), DEFAULT_DIR_MODE);
            create_dir_all_with_mode(&target, mode).map_err(|e| ExtractError::write(&target, e))?;
        } else {
            let mode = permission_bits(file.unix_mode(), DEFAULT_FILE_MODE);
            let mut out = open_truncate(&target, mode).map_err(|e| ExtractError::write(&target, e))?;
            io::copy(&mut file, &mut out).map_err(|e| ExtractError::write(&target, e))?;
        }
        tracing::trace!(path = %target.display(), "extracted zip entry");
    }

    Ok(())
}

/// Strips file-type bits from a stored unix mode.
fn permission_bits(stored: Option<u32>, default: u32) -> u32 {
    stored.map(|m| m & 0o7777).unwrap_or(default)
}

fn open_truncate(path: &Path, mode: u32) -> io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    opts.open(path)
}
