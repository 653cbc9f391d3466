use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Global configuration loaded from `~/.config/hrep/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HrepConfig {
    /// Header that carries the source/destination tokens.
    pub auth_header: String,
    /// Connect timeout in seconds (0 = libcurl default). There is no overall
    /// transfer timeout.
    pub connect_timeout_secs: u64,
    /// Follow redirects on the probe and the download.
    pub follow_redirects: bool,
    /// Maximum number of redirects followed.
    pub max_redirections: u32,
    /// Bytes of source body held in memory before the download is paused.
    pub stream_buffer_bytes: usize,
    /// Optional `User-Agent` override.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HrepConfig {
    fn default() -> Self {
        Self {
            auth_header: "X-Auth-Token".to_string(),
            connect_timeout_secs: 30,
            follow_redirects: true,
            max_redirections: 10,
            stream_buffer_bytes: 1024 * 1024,
            user_agent: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hrep")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HrepConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = HrepConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}

/// Load configuration from an explicit path; the file must exist.
pub fn load_from(path: &Path) -> Result<HrepConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: HrepConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    if cfg.auth_header.trim().is_empty() {
        anyhow::bail!("config {}: auth_header must not be empty", path.display());
    }
    Ok(cfg)
}
