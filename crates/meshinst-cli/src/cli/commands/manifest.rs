//! `meshinst manifest` – print the istioctl-generated manifest.

use anyhow::Result;
use meshinst_core::orchestrator::Orchestrator;

pub fn run_manifest(orch: &Orchestrator<'_>, version: &str, delete: bool) -> Result<()> {
    let manifest = orch.fetch_manifest(version, delete)?;
    print!("{manifest}");
    Ok(())
}
