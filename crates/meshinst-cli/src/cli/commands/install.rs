//! `meshinst install` / `meshinst uninstall`.

use anyhow::Result;
use meshinst_core::orchestrator::{InstallRequest, Orchestrator};

pub fn run_install(orch: &Orchestrator<'_>, version: &str, namespace: &str, delete: bool) -> Result<()> {
    let request = InstallRequest {
        version: version.to_string(),
        namespace: namespace.to_string(),
        delete,
    };
    let status = orch.run(&request)?;
    println!("istio {version}: {status}");
    Ok(())
}
