//! Manifest fetch (run istioctl, capture stdout) and apply (hand to the cluster client).

use crate::cluster::{ApplyOptions, ClusterClient, ClusterError};
use crate::process::ProcessRunner;
use crate::resolver::{ExecutableResolver, ResolveError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// istioctl arguments producing the install manifest.
pub const INSTALL_ARGS: &[&str] = &["install", "--set", "profile=demo", "-y"];
/// istioctl arguments producing the uninstall manifest.
pub const UNINSTALL_ARGS: &[&str] = &["x", "uninstall", "--purge", "-y"];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("resolve istioctl: {0}")]
    Resolve(#[from] ResolveError),
    #[error("launch {}: {source}", program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("istioctl exited with {code:?}: {stderr}")]
    Exit { code: Option<i32>, stderr: String },
}

pub fn istioctl_args(delete: bool) -> &'static [&'static str] {
    if delete {
        UNINSTALL_ARGS
    } else {
        INSTALL_ARGS
    }
}

/// Produces manifests by running a resolved istioctl.
pub struct ManifestFetcher<'a, 'r> {
    resolver: &'a ExecutableResolver<'r>,
    runner: &'a dyn ProcessRunner,
}

impl<'a, 'r> ManifestFetcher<'a, 'r> {
    pub fn new(resolver: &'a ExecutableResolver<'r>, runner: &'a dyn ProcessRunner) -> Self {
        Self { resolver, runner }
    }

    /// Stdout of `istioctl install ...` (or the uninstall variant when `delete`).
    pub fn fetch(&self, version: &str, delete: bool) -> Result<String, FetchError> {
        let executable = self.resolver.resolve(version)?;
        let args = istioctl_args(delete);
        tracing::debug!(executable = %executable.display(), ?args, "fetching manifest");

        let out = self
            .runner
            .run(&executable, args, None)
            .map_err(|source| FetchError::Launch {
                program: executable.clone(),
                source,
            })?;
        if !out.success {
            return Err(FetchError::Exit {
                code: out.code,
                stderr: out.stderr_lossy(),
            });
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

/// Forwards manifests to the cluster collaborator unchanged.
pub struct ManifestApplier<'a> {
    client: &'a dyn ClusterClient,
}

impl<'a> ManifestApplier<'a> {
    pub fn new(client: &'a dyn ClusterClient) -> Self {
        Self { client }
    }

    pub fn apply(&self, contents: &[u8], delete: bool, namespace: &str) -> Result<(), ClusterError> {
        let opts = ApplyOptions {
            namespace: namespace.to_string(),
            delete,
        };
        self.client.apply_manifest(contents, &opts)
    }
}
