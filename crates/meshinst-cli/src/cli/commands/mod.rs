//! CLI command handlers, one per file.

mod install;
mod locate;
mod manifest;

pub use install::run_install;
pub use locate::run_locate;
pub use manifest::run_manifest;
