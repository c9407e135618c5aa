//! Config loading and inspection commands

use std::path::PathBuf;

use anyhow::{Context, Result};
use wayfarer_core::config::{default_config_path, CONFIG_ENV};
use wayfarer_core::{BackendKind, WayfarerConfig};

/// Global flags that adjust the loaded config
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub path: Option<PathBuf>,
    pub backend: Option<String>,
    pub model: Option<String>,
}

/// Load the effective config: file (or defaults), environment, then CLI flags
pub fn load_config(overrides: &ConfigOverrides) -> Result<WayfarerConfig> {
    let mut config =
        WayfarerConfig::load(overrides.path.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, overrides)?;
    Ok(config)
}

/// Apply `--backend` / `--model` on top of a loaded config
///
/// Switching backend drops the configured host and model, which belong to
/// the previous backend.
pub fn apply_overrides(config: &mut WayfarerConfig, overrides: &ConfigOverrides) -> Result<()> {
    if let Some(ref backend) = overrides.backend {
        let backend: BackendKind = backend.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        if backend != config.ai.backend {
            config.ai.backend = backend;
            config.ai.host = None;
            config.ai.model = None;
        }
    }

    if let Some(ref model) = overrides.model {
        config.ai.model = Some(model.clone());
    }

    Ok(())
}

/// Print the effective configuration as TOML
pub fn cmd_config_show(config: &WayfarerConfig) -> Result<()> {
    let rendered = config.to_toml()?;

    println!("{}", rendered.trim_end());
    println!();
    println!(
        "# api_key: {}",
        if config.ai.api_key.is_some() {
            "set"
        } else {
            "not set"
        }
    );

    Ok(())
}

/// Show where the config file is read from
pub fn cmd_config_path() -> Result<()> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        println!("{} (from {})", path, CONFIG_ENV);
        return Ok(());
    }

    match default_config_path() {
        Some(path) => {
            println!("{}", path.display());

            if !path.exists() {
                eprintln!();
                eprintln!("Note: This file does not exist yet; built-in defaults are used.");
                eprintln!("Run `wayfarer config show > {}` to start one.", path.display());
            }
        }
        None => {
            eprintln!("Could not determine config directory.");
            eprintln!("Use --config or set {} instead.", CONFIG_ENV);
        }
    }

    Ok(())
}
