//! Command-line arguments of `crem-site`.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ConfigError, PipelineConfig};
use crate::demo::DEFAULT_SEED;

#[derive(Parser, Debug)]
#[command(name = "crem-site")]
#[command(about = "Prepare C-REM scenario results and charts for the website")]
pub struct Args {
    /// TOML configuration file
    #[arg(long, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Built-in configuration (cop21, demo)
    #[arg(long)]
    pub preset: Option<String>,

    /// Override the directory holding the archive dumps
    #[arg(long)]
    pub gdx_dir: Option<PathBuf>,

    /// Override the output directory
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Write the air-pollution chart fragment to this file
    #[arg(long)]
    pub viz_out: Option<PathBuf>,

    /// Draw the low-NH3 variants in the chart fragment
    #[arg(long, requires = "viz_out")]
    pub with_nh3: bool,

    /// Seed of the synthetic data for the demo preset
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Serve the prepared data over HTTP after the run
    #[cfg(feature = "api")]
    #[arg(long)]
    pub serve: bool,

    /// Port of the preview server
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
}

impl Args {
    /// Name of the preset in use; `cop21` unless a config file or another
    /// preset is given.
    pub fn preset_name(&self) -> Option<&str> {
        match (&self.config, &self.preset) {
            (Some(_), _) => None,
            (None, Some(name)) => Some(name.as_str()),
            (None, None) => Some("cop21"),
        }
    }

    /// Loads the configuration and applies the path overrides.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an unreadable file or unknown preset.
    pub fn load_config(&self) -> Result<PipelineConfig, ConfigError> {
        let mut config = match (&self.config, self.preset_name()) {
            (Some(path), _) => PipelineConfig::from_toml_file(path)?,
            (None, Some(name)) => PipelineConfig::from_preset(name)?,
            (None, None) => PipelineConfig::cop21(),
        };
        if let Some(dir) = &self.gdx_dir {
            config.paths.gdx_dir = dir.clone();
        }
        if let Some(dir) = &self.out_dir {
            config.paths.out_dir = dir.clone();
        }
        Ok(config)
    }

    /// Whether inputs come from the synthetic demo data set.
    pub fn uses_demo_data(&self) -> bool {
        self.preset_name() == Some("demo")
    }
}
