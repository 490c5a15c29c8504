pub mod config;
pub mod logging;

pub mod archive;
pub mod cluster;
pub mod download;
pub mod install;
pub mod manifest;
pub mod orchestrator;
pub mod platform;
pub mod process;
pub mod resolver;
