//! Install/remove entry point: fetch the manifest with istioctl, then apply it.

use crate::cluster::{ClusterClient, ClusterError};
use crate::config::ConfigSource;
use crate::download::HttpFetch;
use crate::manifest::{FetchError, ManifestApplier, ManifestFetcher};
use crate::platform::Platform;
use crate::process::ProcessRunner;
use crate::resolver::{ExecutableResolver, ResolveError, SearchPath};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Lifecycle status reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Installing,
    Removing,
    Installed,
    Removed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Installing => "installing",
            Status::Removing => "removing",
            Status::Installed => "installed",
            Status::Removed => "removed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("unable to retrieve mesh configuration: {0}")]
    MeshConfig(String),
    #[error("error installing istio: {0}")]
    FetchManifest(#[from] FetchError),
    #[error("error installing istio: apply manifest: {0}")]
    ApplyManifest(#[source] ClusterError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// A failed request: the status it started in plus the stage error.
#[derive(Debug, Error)]
#[error("{status}: {error}")]
pub struct InstallFailure {
    pub status: Status,
    #[source]
    pub error: InstallError,
}

/// What the caller wants: install `version`, or remove it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub version: String,
    /// Accepted for interface compatibility; always overridden to empty.
    pub namespace: String,
    pub delete: bool,
}

/// Ties config, executable resolution, manifest fetch and apply together.
///
/// Requests are synchronous. Two requests sharing an installation root must
/// not run concurrently; serialize them in the caller.
pub struct Orchestrator<'a> {
    config: &'a dyn ConfigSource,
    http: &'a dyn HttpFetch,
    runner: &'a dyn ProcessRunner,
    cluster: &'a dyn ClusterClient,
    search_path: SearchPath,
    platform: Option<Platform>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a dyn ConfigSource,
        http: &'a dyn HttpFetch,
        runner: &'a dyn ProcessRunner,
        cluster: &'a dyn ClusterClient,
    ) -> Self {
        Self {
            config,
            http,
            runner,
            cluster,
            search_path: SearchPath::from_env(),
            platform: Platform::host(),
        }
    }

    /// Replaces the search path consulted before the installation root.
    pub fn with_search_path(mut self, search_path: SearchPath) -> Self {
        self.search_path = search_path;
        self
    }

    /// Replaces the host platform descriptor.
    pub fn with_platform(mut self, platform: Option<Platform>) -> Self {
        self.platform = platform;
        self
    }

    /// Runs fetch -> apply for `req`. On failure the initial status
    /// (`Installing`/`Removing`) is returned with the stage error; nothing
    /// already written to disk is rolled back.
    pub fn run(&self, req: &InstallRequest) -> Result<Status, InstallFailure> {
        tracing::info!("requested install of version: {}", req.version);
        tracing::info!("requested action is delete: {}", req.delete);
        tracing::info!("requested action is in namespace: {}", req.namespace);

        // istio's default topology cannot be moved to a custom namespace.
        let namespace = "";
        tracing::debug!("overridden namespace: {:?}", namespace);

        let status = if req.delete {
            Status::Removing
        } else {
            Status::Installing
        };
        let fail = |error: InstallError| {
            tracing::error!("{}", error);
            InstallFailure { status, error }
        };

        let manifest = self
            .fetch_manifest(&req.version, req.delete)
            .map_err(fail)?;

        ManifestApplier::new(self.cluster)
            .apply(manifest.as_bytes(), req.delete, namespace)
            .map_err(|e| fail(InstallError::ApplyManifest(e)))?;

        Ok(if req.delete {
            Status::Removed
        } else {
            Status::Installed
        })
    }

    /// Resolves istioctl for `version` and returns the manifest it prints.
    pub fn fetch_manifest(&self, version: &str, delete: bool) -> Result<String, InstallError> {
        let resolver = self.resolver()?;
        let manifest = ManifestFetcher::new(&resolver, self.runner).fetch(version, delete)?;
        Ok(manifest)
    }

    /// Resolves (downloading if needed) istioctl for `version`.
    pub fn locate(&self, version: &str) -> Result<PathBuf, InstallError> {
        Ok(self.resolver()?.resolve(version)?)
    }

    fn resolver(&self) -> Result<ExecutableResolver<'a>, InstallError> {
        let cfg = self
            .config
            .load()
            .map_err(|e| InstallError::MeshConfig(format!("{:#}", e)))?;
        let bin_dir = cfg
            .bin_path()
            .map_err(|e| InstallError::MeshConfig(format!("{:#}", e)))?;
        Ok(ExecutableResolver::new(
            self.search_path.clone(),
            bin_dir,
            self.platform.clone(),
            self.http,
            cfg.release_base_url,
        ))
    }
}
