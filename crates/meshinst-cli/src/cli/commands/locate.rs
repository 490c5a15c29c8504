//! `meshinst locate` – print the istioctl path for a release.

use anyhow::Result;
use meshinst_core::orchestrator::Orchestrator;

pub fn run_locate(orch: &Orchestrator<'_>, version: &str) -> Result<()> {
    let path = orch.locate(version)?;
    println!("{}", path.display());
    Ok(())
}
