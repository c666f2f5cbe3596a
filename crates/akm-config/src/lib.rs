mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// `<user config dir>/akm-fusion/`. Not created until a config is saved.
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("akm-fusion"))
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// Returns the config file path: <user config dir>/akm-fusion/config.toml
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from the default location, or return defaults if not found.
pub fn load_config() -> Result<EngineConfig> {
    load_config_from(&config_path()?)
}

/// Load config from an explicit path, or return defaults if it does not exist.
pub fn load_config_from(path: &Path) -> Result<EngineConfig> {
    if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: EngineConfig =
            toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
        info!(?path, "Loaded config");
        Ok(config)
    } else {
        info!(?path, "No config found, using defaults");
        Ok(EngineConfig::default())
    }
}

/// Save config to the default location.
pub fn save_config(config: &EngineConfig) -> Result<()> {
    save_config_to(config, &config_path()?)
}

/// Save config to an explicit path, creating missing parent directories.
pub fn save_config_to(config: &EngineConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    info!(?path, "Saved config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("akm-fusion").join("config.toml");

        let mut config = EngineConfig::default();
        config.mag_filter = FilterConfig::Exponential { alpha: 0.25 };
        config.layout.form_factor_count = 2;
        config.layout.form_factors = vec![IDENTITY_LAYOUT, [[0, -1, 0], [1, 0, 0], [0, 0, 1]]];

        save_config_to(&config, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "accel_range = \"fast\"").unwrap();
        assert!(load_config_from(&path).is_err());
    }
}
