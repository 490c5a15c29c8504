//! Cluster-apply collaborator: takes raw manifest bytes and applies or deletes them.

use crate::process::{ProcessRunner, SystemRunner};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Where and how a manifest is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Target namespace; empty means whatever each resource declares.
    pub namespace: String,
    /// Delete the resources instead of creating/updating them.
    pub delete: bool,
}

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("launch {}: {source}", program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cluster rejected manifest (exit {code:?}): {stderr}")]
    Rejected { code: Option<i32>, stderr: String },
}

/// Applies manifests to a cluster.
pub trait ClusterClient {
    fn apply_manifest(&self, contents: &[u8], opts: &ApplyOptions) -> Result<(), ClusterError>;
}

/// [`ClusterClient`] that pipes manifests into `kubectl apply|delete -f -`.
#[derive(Debug, Clone)]
pub struct KubectlClient<R = SystemRunner> {
    program: PathBuf,
    runner: R,
}

impl KubectlClient<SystemRunner> {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self::with_runner(program, SystemRunner)
    }
}

impl<R: ProcessRunner> KubectlClient<R> {
    pub fn with_runner(program: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }
}

/// kubectl arguments for `opts`; the manifest is read from stdin.
pub fn kubectl_args(opts: &ApplyOptions) -> Vec<&str> {
    let mut args = if opts.delete {
        vec!["delete", "--ignore-not-found"]
    } else {
        vec!["apply"]
    };
    if !opts.namespace.is_empty() {
        args.push("-n");
        args.push(opts.namespace.as_str());
    }
    args.extend(["-f", "-"]);
    args
}

impl<R: ProcessRunner> ClusterClient for KubectlClient<R> {
    fn apply_manifest(&self, contents: &[u8], opts: &ApplyOptions) -> Result<(), ClusterError> {
        let args = kubectl_args(opts);
        let out = self
            .runner
            .run(&self.program, &args, Some(contents))
            .map_err(|source| ClusterError::Launch {
                program: self.program.clone(),
                source,
            })?;
        if !out.success {
            return Err(ClusterError::Rejected {
                code: out.code,
                stderr: out.stderr_lossy(),
            });
        }
        tracing::debug!("{}", String::from_utf8_lossy(&out.stdout).trim());
        Ok(())
    }
}
