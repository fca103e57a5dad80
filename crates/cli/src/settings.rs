//! Configuration file + command-line overrides

use anyhow::{Context, Result};
use clap::Args;
use reload_core::ReloaderConfig;
use std::path::PathBuf;

/// Flags layered over the configuration file
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// TOML configuration file (default: built-in settings)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the config directory to watch
    #[arg(long = "config-path", global = true, value_name = "DIR")]
    pub config_path: Option<PathBuf>,

    /// Quiet period after the last change before reloading, in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// systemd unit to restart
    #[arg(long, global = true)]
    pub unit: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Overrides {
    /// Load the configuration file (if any), apply flags, validate
    pub fn resolve(&self) -> Result<ReloaderConfig> {
        let mut config = ReloaderConfig::load(self.config.as_deref())
            .context("Failed to load configuration")?;
        self.apply(&mut config);

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    fn apply(&self, config: &mut ReloaderConfig) {
        if let Some(path) = &self.config_path {
            config.watch.path = path.clone();
        }
        if let Some(debounce_ms) = self.debounce_ms {
            config.watch.debounce_ms = debounce_ms;
        }
        if let Some(unit) = &self.unit {
            config.service.unit = unit.clone();
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        if let Some(file) = &self.log_file {
            config.log.file = Some(file.clone());
        }
    }
}
