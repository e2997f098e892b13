use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The file-backed half of the three-layer configuration (§9.D): `root_id`
/// and `local_path`, the two values the CLI's `--set-root-id`/
/// `--set-location` flags persist. Everything else the core needs at
/// runtime (token, delta_link, last_sync_time, db_version) lives in the
/// `sync-store` database instead.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Config {
    pub root_id: Option<String>,
    pub local_path: Option<PathBuf>,
}

/// Resolves the config file's path: `$ONEDRIVE_CONFIG_PATH` if set,
/// otherwise `<dirs::config_dir()>/odsync/config.toml`.
pub fn config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("ONEDRIVE_CONFIG_PATH") {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir().context("could not resolve a platform config directory")?;
    Ok(base.join("odsync").join("config.toml"))
}

/// The sqlite database sits next to the TOML file, under the same
/// directory, so `$ONEDRIVE_CONFIG_PATH` relocates both at once.
pub fn db_path(config_path: &Path) -> PathBuf {
    config_path.with_file_name("state.sqlite3")
}

pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("could not read config file at {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("could not parse config file at {}", path.display()))
}

pub fn save(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("could not create config directory at {}", parent.display()))?;
    }
    let content = toml::to_string(config).context("could not serialize config")?;
    std::fs::write(path, content).with_context(|| format!("could not write config file at {}", path.display()))
}
