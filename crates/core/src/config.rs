//! Reloader configuration
//!
//! Loaded from an optional TOML file; every key has a default so an empty
//! (or absent) file yields a working kubelet setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default directory watched for config drop-ins
pub const DEFAULT_WATCH_PATH: &str = "/var/lib/kubelet/conf.d";

/// Default debounce window
pub const DEFAULT_DEBOUNCE_MS: u64 = 2000;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Top-level reloader configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReloaderConfig {
    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// What to watch and how long to coalesce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Directory to watch (default: /var/lib/kubelet/conf.d)
    #[serde(default = "default_watch_path")]
    pub path: PathBuf,

    /// Literal, case-sensitive file name suffix that marks a config file
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Debounce window in milliseconds (default: 2000)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            path: default_watch_path(),
            suffix: default_suffix(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

/// The service being reloaded and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// systemd unit to restart (default: kubelet)
    #[serde(default = "default_unit")]
    pub unit: String,

    /// `pkill -f` pattern used by the signal fallback
    #[serde(default = "default_process_pattern")]
    pub process_pattern: String,

    /// Signal name sent by the fallback, without the SIG prefix
    #[serde(default = "default_signal")]
    pub signal: String,

    /// Per-command timeout in seconds; 0 waits forever
    #[serde(default)]
    pub command_timeout_secs: u64,

    /// Never run two reload chains at the same time
    #[serde(default)]
    pub serialize_reloads: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            unit: default_unit(),
            process_pattern: default_process_pattern(),
            signal: default_signal(),
            command_timeout_secs: 0,
            serialize_reloads: false,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Maximum level: trace, debug, info, warn or error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write logs to this file instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_watch_path() -> PathBuf {
    PathBuf::from(DEFAULT_WATCH_PATH)
}

fn default_suffix() -> String {
    ".conf".to_string()
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_unit() -> String {
    "kubelet".to_string()
}

fn default_process_pattern() -> String {
    "^/usr/bin/kubelet".to_string()
}

fn default_signal() -> String {
    "HUP".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ReloaderConfig {
    /// Load configuration from `path`, or defaults when no path is given
    ///
    /// A path that is given but missing is an error: silently falling back
    /// to defaults would watch the wrong directory.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.watch.path.as_os_str().is_empty() {
            return Err(invalid("watch.path", "must not be empty"));
        }

        if self.watch.suffix.is_empty() {
            return Err(invalid("watch.suffix", "must not be empty"));
        }

        if !(1..=600_000).contains(&self.watch.debounce_ms) {
            return Err(invalid(
                "watch.debounce_ms",
                format!("{} is outside 1-600000", self.watch.debounce_ms),
            ));
        }

        if self.service.unit.trim().is_empty() {
            return Err(invalid("service.unit", "must not be empty"));
        }

        if self.service.process_pattern.trim().is_empty() {
            return Err(invalid("service.process_pattern", "must not be empty"));
        }

        let signal = &self.service.signal;
        if signal.is_empty() || !signal.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid(
                "service.signal",
                format!("'{}' is not a signal name (e.g. HUP)", signal),
            ));
        }

        if self.service.command_timeout_secs > 3600 {
            return Err(invalid(
                "service.command_timeout_secs",
                format!("{} is outside 0-3600", self.service.command_timeout_secs),
            ));
        }

        let level = self.log.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(invalid(
                "log.level",
                format!("'{}' is not one of {}", self.log.level, LOG_LEVELS.join(", ")),
            ));
        }

        Ok(())
    }

    /// Debounce window as a duration
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.watch.debounce_ms)
    }

    /// Per-command timeout, if one is configured
    pub fn command_timeout(&self) -> Option<Duration> {
        match self.service.command_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}

/// Example configuration file with every key spelled out
pub fn example_config() -> &'static str {
    r#"# agent-reloader configuration

[watch]
# Directory containing the agent's config drop-ins
path = "/var/lib/kubelet/conf.d"
# Only files ending in this literal suffix trigger a reload
suffix = ".conf"
# Quiet period after the last change before reloading
debounce_ms = 2000

[service]
# systemd unit restarted on change
unit = "kubelet"
# Fallback: pkill -<signal> -f <process_pattern>
process_pattern = "^/usr/bin/kubelet"
signal = "HUP"
# Kill systemctl/pkill after this many seconds (0 = wait forever)
command_timeout_secs = 0
# Wait for a running reload to finish before starting another
serialize_reloads = false

[log]
level = "info"
# file = "/var/log/agent-reloader.log"
"#
}
