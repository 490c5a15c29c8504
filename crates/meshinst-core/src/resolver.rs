//! Executable resolution: find istioctl on disk, or download and install it.
//!
//! Lookups are tried in order and the first hit wins:
//! 1. `istioctl` on the search path
//! 2. `istioctl-<version>` on the search path
//! 3. `istioctl-<version>` in the installation root's `bin` directory
//!
//! When none match, the release archive is downloaded into `bin` and
//! normalized; the resulting path is returned.

use crate::download::{download_binary, DownloadError, HttpFetch};
use crate::install::{extract_and_clean, install_binary, InstallBinaryError};
use crate::platform::{versioned_name, Platform, BINARY_NAME};
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error(transparent)]
    Install(#[from] InstallBinaryError),
}

/// Ordered list of directories searched for executables (like `PATH`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            dirs: dirs.into_iter().collect(),
        }
    }

    /// The current process's `PATH`.
    pub fn from_env() -> Self {
        Self::from_os_str(&env::var_os("PATH").unwrap_or_default())
    }

    pub fn from_os_str(path: &OsStr) -> Self {
        Self::new(env::split_paths(path).filter(|d| !d.as_os_str().is_empty()))
    }

    /// First directory holding an executable regular file called `file_name`.
    pub fn find(&self, file_name: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(file_name))
            .find(|candidate| is_executable(candidate))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

/// One place an existing binary may be found.
pub trait ExecutableLookup {
    /// Short description for logs.
    fn describe(&self) -> String;
    fn find(&self, version: &str) -> Option<PathBuf>;
}

/// Binary named `name` (or the version-qualified name) on a [`SearchPath`].
pub struct OnSearchPath {
    search_path: SearchPath,
    versioned: bool,
    suffix: &'static str,
}

impl ExecutableLookup for OnSearchPath {
    fn describe(&self) -> String {
        if self.versioned {
            format!("{}-<version> in the search path", BINARY_NAME)
        } else {
            format!("{} in the search path", BINARY_NAME)
        }
    }

    fn find(&self, version: &str) -> Option<PathBuf> {
        let name = if self.versioned {
            versioned_name(version)
        } else {
            BINARY_NAME.to_string()
        };
        self.search_path.find(&format!("{}{}", name, self.suffix))
    }
}

/// Version-qualified binary previously installed under `bin_dir`.
pub struct InBinDir {
    bin_dir: PathBuf,
    suffix: &'static str,
}

impl ExecutableLookup for InBinDir {
    fn describe(&self) -> String {
        self.bin_dir.display().to_string()
    }

    fn find(&self, version: &str) -> Option<PathBuf> {
        let candidate = self
            .bin_dir
            .join(format!("{}{}", versioned_name(version), self.suffix));
        candidate.exists().then_some(candidate)
    }
}

/// Resolves a ready-to-run istioctl for a release, acquiring it if needed.
pub struct ExecutableResolver<'a> {
    lookups: Vec<Box<dyn ExecutableLookup + 'a>>,
    bin_dir: PathBuf,
    platform: Option<Platform>,
    http: &'a dyn HttpFetch,
    release_base_url: String,
}

impl<'a> ExecutableResolver<'a> {
    /// Resolver with the standard lookup chain.
    ///
    /// `platform` is the host descriptor; `None` means istioctl is not
    /// published for the host, so only pre-existing binaries can be used.
    pub fn new(
        search_path: SearchPath,
        bin_dir: impl Into<PathBuf>,
        platform: Option<Platform>,
        http: &'a dyn HttpFetch,
        release_base_url: impl Into<String>,
    ) -> Self {
        let bin_dir = bin_dir.into();
        let suffix = platform
            .as_ref()
            .map(|p| p.policy().exe_suffix)
            .unwrap_or("");
        let lookups: Vec<Box<dyn ExecutableLookup + 'a>> = vec![
            Box::new(OnSearchPath {
                search_path: search_path.clone(),
                versioned: false,
                suffix,
            }),
            Box::new(OnSearchPath {
                search_path,
                versioned: true,
                suffix,
            }),
            Box::new(InBinDir {
                bin_dir: bin_dir.clone(),
                suffix,
            }),
        ];
        Self {
            lookups,
            bin_dir,
            platform,
            http,
            release_base_url: release_base_url.into(),
        }
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Returns the path of an istioctl for `version`, downloading it if no lookup matches.
    pub fn resolve(&self, version: &str) -> Result<PathBuf, ResolveError> {
        for lookup in &self.lookups {
            tracing::info!("looking for istioctl: {}", lookup.describe());
            if let Some(found) = lookup.find(version) {
                tracing::info!(path = %found.display(), "found istioctl");
                return Ok(found);
            }
        }

        tracing::info!("istioctl {} not found locally, downloading", version);
        self.acquire(version)
    }

    fn acquire(&self, version: &str) -> Result<PathBuf, ResolveError> {
        let platform = self.platform.as_ref().ok_or_else(|| {
            DownloadError::UnsupportedPlatform {
                os: env::consts::OS.to_string(),
                arch: env::consts::ARCH.to_string(),
            }
        })?;

        let body = download_binary(self.http, &self.release_base_url, platform, version)?;

        let bin_name = versioned_name(version);
        tracing::info!("installing istioctl {} into {}", version, self.bin_dir.display());
        install_binary(&self.bin_dir.join(&bin_name), platform, body)?;
        let path = extract_and_clean(&self.bin_dir, &bin_name, platform)?;

        tracing::info!(path = %path.display(), "istioctl ready");
        Ok(path)
    }
}
