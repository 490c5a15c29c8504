use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_RELEASE_BASE_URL: &str = "https://github.com/istio/istio/releases/download";
pub const DEFAULT_VERSION: &str = "1.18.0";

/// Adapter configuration loaded from `~/.config/meshinst/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Installation root; downloaded binaries live under `<root_path>/bin`.
    /// Defaults to `~/.local/share/meshinst` when unset.
    pub root_path: Option<PathBuf>,
    /// Base URL that release archives are fetched from.
    pub release_base_url: String,
    /// Version used when a command does not name one.
    pub default_version: String,
    /// Program used to apply manifests to the cluster.
    pub kubectl: String,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            root_path: None,
            release_base_url: DEFAULT_RELEASE_BASE_URL.to_string(),
            default_version: DEFAULT_VERSION.to_string(),
            kubectl: "kubectl".to_string(),
        }
    }
}

impl AdapterConfig {
    /// The configured root path, or the XDG data home default.
    pub fn root_path(&self) -> Result<PathBuf> {
        match &self.root_path {
            Some(p) => Ok(p.clone()),
            None => {
                let xdg_dirs = xdg::BaseDirectories::with_prefix("meshinst")?;
                Ok(xdg_dirs.get_data_home())
            }
        }
    }

    /// Directory holding version-qualified binaries.
    pub fn bin_path(&self) -> Result<PathBuf> {
        Ok(self.root_path()?.join("bin"))
    }
}

/// Source of adapter configuration, consulted afresh on every request.
pub trait ConfigSource {
    fn load(&self) -> Result<AdapterConfig>;
}

/// A fixed, already-loaded configuration.
impl ConfigSource for AdapterConfig {
    fn load(&self) -> Result<AdapterConfig> {
        Ok(self.clone())
    }
}

/// Configuration read from a TOML file, created with defaults when missing.
#[derive(Debug, Clone)]
pub struct FileConfig {
    path: PathBuf,
}

impl FileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file at the default XDG config location.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(config_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfig {
    fn load(&self) -> Result<AdapterConfig> {
        load_or_init_at(&self.path)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("meshinst")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from the default location, creating a default file if none exists.
pub fn load_or_init() -> Result<AdapterConfig> {
    load_or_init_at(&config_path()?)
}

/// Load configuration from `path`, creating a default file if none exists.
pub fn load_or_init_at(path: &Path) -> Result<AdapterConfig> {
    if !path.exists() {
        let default_cfg = AdapterConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create config dir {}", parent.display()))?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: AdapterConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
