use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::models::Config;

/// Load configuration. Lookup order:
///   1. Explicit path (must exist)
///   2. `RUNAFTER_CONFIG_DIR/config.json`
///   3. Platform config dir (`dirs::config_dir()/runafter/config.json`)
///   4. Defaults
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_path {
        if path.exists() {
            let config = read_config(path).context("Failed to load config file")?;
            tracing::info!("Loaded config from: {}", path.display());
            return Ok(config);
        }
        return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
    }

    if let Ok(config_dir) = std::env::var("RUNAFTER_CONFIG_DIR") {
        let path = PathBuf::from(&config_dir).join("config.json");
        if path.exists() {
            let config =
                read_config(&path).context("Failed to load config from RUNAFTER_CONFIG_DIR")?;
            tracing::info!("Loaded config from RUNAFTER_CONFIG_DIR: {}", path.display());
            return Ok(config);
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("runafter").join("config.json");
        if path.exists() {
            let config =
                read_config(&path).context("Failed to load config from platform config dir")?;
            tracing::info!("Loaded config from: {}", path.display());
            return Ok(config);
        }
    }

    tracing::info!("No config file found, using defaults");
    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}
