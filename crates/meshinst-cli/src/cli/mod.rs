//! CLI for installing and removing Istio through istioctl.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use meshinst_core::cluster::KubectlClient;
use meshinst_core::config::{ConfigSource, FileConfig};
use meshinst_core::download::CurlFetcher;
use meshinst_core::orchestrator::Orchestrator;
use meshinst_core::process::SystemRunner;
use std::path::PathBuf;

use commands::{run_install, run_locate, run_manifest};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "meshinst")]
#[command(about = "Install or remove Istio using a managed istioctl", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/meshinst/config.toml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Install Istio (istioctl demo profile) on the current cluster.
    Install {
        /// istioctl release, e.g. 1.18.0 (default from config).
        #[arg(long)]
        version: Option<String>,
        /// Requested namespace. Istio always installs into its default namespaces.
        #[arg(long, short = 'n', default_value = "")]
        namespace: String,
    },

    /// Remove Istio from the current cluster.
    Uninstall {
        /// istioctl release, e.g. 1.18.0 (default from config).
        #[arg(long)]
        version: Option<String>,
        /// Requested namespace. Istio always installs into its default namespaces.
        #[arg(long, short = 'n', default_value = "")]
        namespace: String,
    },

    /// Print the manifest istioctl generates, without applying it.
    Manifest {
        /// istioctl release, e.g. 1.18.0 (default from config).
        #[arg(long)]
        version: Option<String>,
        /// Print the uninstall manifest instead.
        #[arg(long)]
        delete: bool,
    },

    /// Print the path of the istioctl used for a release, downloading it if needed.
    Locate {
        /// istioctl release, e.g. 1.18.0 (default from config).
        #[arg(long)]
        version: Option<String>,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        let source = match cli.config {
            Some(path) => FileConfig::new(path),
            None => FileConfig::default_location()?,
        };
        let cfg = source.load()?;
        tracing::debug!("loaded config from {}: {:?}", source.path().display(), cfg);

        let http = CurlFetcher::new();
        let runner = SystemRunner;
        let cluster = KubectlClient::new(&cfg.kubectl);
        let orch = Orchestrator::new(&source, &http, &runner, &cluster);
        let version_or_default = |v: Option<String>| v.unwrap_or_else(|| cfg.default_version.clone());

        match cli.command {
            CliCommand::Install { version, namespace } => {
                run_install(&orch, &version_or_default(version), &namespace, false)?
            }
            CliCommand::Uninstall { version, namespace } => {
                run_install(&orch, &version_or_default(version), &namespace, true)?
            }
            CliCommand::Manifest { version, delete } => {
                run_manifest(&orch, &version_or_default(version), delete)?
            }
            CliCommand::Locate { version } => run_locate(&orch, &version_or_default(version))?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
