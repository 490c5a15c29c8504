//! Release archive extraction.
//!
//! Reproduces an archive's directory/file tree under a destination root.
//! Entry names are joined onto the root as-is: archives are trusted to come
//! from official istio releases, so a crafted `../` entry could escape the
//! root. Only feed archives from that source.

mod error;
mod targz;
mod unzip;

use crate::platform::ArchiveFormat;
use std::io::Read;
use std::path::Path;

pub use error::ExtractError;
pub use targz::extract_tar_gz;
pub use unzip::extract_zip;

/// Permissions for directories created from tar entries (rwxr-x---).
pub const DIR_MODE: u32 = 0o750;

/// Extracts `stream` (in `format`) under `dest`.
pub fn extract<R: Read>(format: ArchiveFormat, dest: &Path, stream: R) -> Result<(), ExtractError> {
    match format {
        ArchiveFormat::TarGz => extract_tar_gz(dest, stream),
        ArchiveFormat::Zip => extract_zip(dest, stream),
    }
}

/// Creates `path` and missing parents with `mode` (unix only; ignored elsewhere).
pub(crate) fn create_dir_all_with_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(path)
}
