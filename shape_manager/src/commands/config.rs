//! `shapedisplay config`: print or write a configuration file

use anyhow::{Context, Result};
use clap::ValueEnum;
use shape_core::ShapeConfig;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Yaml,
}

/// Render the effective configuration (defaults when no file is found)
pub fn render_config(source: Option<&Path>, format: ConfigFormat) -> Result<String> {
    let config = ShapeConfig::discover(source).context("Failed to load configuration")?;
    let text = match format {
        ConfigFormat::Toml => config.to_toml_string()?,
        ConfigFormat::Yaml => config.to_yaml_string()?,
    };
    Ok(text)
}

pub fn execute_config(
    source: Option<PathBuf>,
    format: ConfigFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    match output {
        Some(path) => {
            let config =
                ShapeConfig::discover(source.as_deref()).context("Failed to load configuration")?;
            config
                .save_to_disk(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", render_config(source.as_deref(), format)?),
    }
    Ok(())
}
