//! Writes a downloaded release onto disk and normalizes it into a single
//! version-qualified executable.

use crate::archive::{self, ExtractError};
use crate::download::ResponseBody;
use crate::platform::{Platform, BINARY_NAME};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Permissions of the final binary on platforms that need them set (rwxr-x---).
pub const BINARY_MODE: u32 = 0o750;

#[derive(Debug, Error)]
pub enum InstallBinaryError {
    #[error("create install dir {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("install binary: {0}")]
    Extract(#[from] ExtractError),
    #[error("{op} {}: {source}", path.display())]
    Normalize {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Ensures `location` exists and extracts `body` into it using the archive
/// format of `platform`. Consumes the body, so it is closed exactly once on
/// every path out of this function.
pub fn install_binary(
    location: &Path,
    platform: &Platform,
    body: ResponseBody,
) -> Result<(), InstallBinaryError> {
    archive::create_dir_all_with_mode(location, archive::DIR_MODE).map_err(|source| {
        InstallBinaryError::CreateDir {
            path: location.to_path_buf(),
            source,
        }
    })?;

    tracing::debug!(location = %location.display(), platform = %platform, "extracting release archive");
    archive::extract(platform.policy().archive, location, body)?;
    Ok(())
}

/// Turns `<location>/<bin_name>/istioctl[.exe]` into `<location>/<bin_name>[.exe]`.
///
/// Moves the binary up to `location`, removes the extraction directory,
/// renames the binary to its version-qualified name and, where the platform
/// requires it, sets the execute bits. Returns the final path.
pub fn extract_and_clean(
    location: &Path,
    bin_name: &str,
    platform: &Platform,
) -> Result<PathBuf, InstallBinaryError> {
    let platform_name = platform.executable_name(BINARY_NAME);
    let extracted_dir = location.join(bin_name);
    let staged = location.join(&platform_name);

    rename(&extracted_dir.join(&platform_name), &staged)?;

    fs::remove_dir_all(&extracted_dir).map_err(|source| InstallBinaryError::Normalize {
        op: "remove",
        path: extracted_dir.clone(),
        source,
    })?;

    let final_path = location.join(platform.executable_name(bin_name));
    rename(&staged, &final_path)?;

    if platform.policy().set_exec_bits {
        set_executable(&final_path)?;
    }

    tracing::debug!(path = %final_path.display(), "istioctl installed");
    Ok(final_path)
}

fn rename(from: &Path, to: &Path) -> Result<(), InstallBinaryError> {
    fs::rename(from, to).map_err(|source| InstallBinaryError::Normalize {
        op: "rename",
        path: from.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<(), InstallBinaryError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(BINARY_MODE)).map_err(|source| {
        InstallBinaryError::Normalize {
            op: "chmod",
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<(), InstallBinaryError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::testutil;
    use crate::platform::Os;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn install_then_normalize_linux_tarball() {
        let bin = tempfile::tempdir().unwrap();
        let platform = Platform::new(Os::Linux, "amd64");
        let location = bin.path().join("istioctl-1.18.0");
        let data = testutil::tar_gz(&[], &[("istioctl", b"#!/bin/sh\n".as_slice())]);

        install_binary(&location, &platform, ResponseBody::from_bytes(data)).unwrap();
        assert!(location.join("istioctl").is_file());

        let final_path = extract_and_clean(bin.path(), "istioctl-1.18.0", &platform).unwrap();
        assert_eq!(final_path, bin.path().join("istioctl-1.18.0"));
        assert_eq!(entries(bin.path()), ["istioctl-1.18.0"]);
        assert!(final_path.is_file());
        assert_eq!(fs::read(&final_path).unwrap(), b"#!/bin/sh\n");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&final_path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, BINARY_MODE);
        }
    }

    #[test]
    fn normalize_windows_layout_keeps_suffix() {
        let bin = tempfile::tempdir().unwrap();
        let platform = Platform::new(Os::Windows, "amd64");
        let location = bin.path().join("istioctl-1.18.0");
        let data = testutil::zip(&[], &[("istioctl.exe", b"MZ".as_slice())]);

        install_binary(&location, &platform, ResponseBody::from_bytes(data)).unwrap();
        let final_path = extract_and_clean(bin.path(), "istioctl-1.18.0", &platform).unwrap();

        assert_eq!(final_path, bin.path().join("istioctl-1.18.0.exe"));
        assert_eq!(entries(bin.path()), ["istioctl-1.18.0.exe"]);
        assert_eq!(fs::read(&final_path).unwrap(), b"MZ");
    }

    #[test]
    fn missing_binary_in_archive_is_a_normalize_error() {
        let bin = tempfile::tempdir().unwrap();
        let platform = Platform::new(Os::Darwin, "arm64");
        let location = bin.path().join("istioctl-1.18.0");
        let data = testutil::tar_gz(&[], &[("README.md", b"docs".as_slice())]);

        install_binary(&location, &platform, ResponseBody::from_bytes(data)).unwrap();
        let err = extract_and_clean(bin.path(), "istioctl-1.18.0", &platform).unwrap_err();
        assert!(matches!(err, InstallBinaryError::Normalize { op: "rename", .. }), "{err}");
    }

    #[test]
    fn corrupt_archive_is_an_install_failure() {
        let bin = tempfile::tempdir().unwrap();
        let platform = Platform::new(Os::Linux, "amd64");
        let err = install_binary(
            &bin.path().join("istioctl-1.18.0"),
            &platform,
            ResponseBody::from_bytes(b"<html>not found</html>".to_vec()),
        )
        .unwrap_err();
        assert!(matches!(err, InstallBinaryError::Extract(ExtractError::Decompress(_))));
    }
}
