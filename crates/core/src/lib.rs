//! Shared types for the agent config reloader
//!
//! This crate provides:
//! - The change event model produced by the directory watcher
//! - The reloader configuration (TOML file + defaults + validation)
//! - The [`ReloadHandler`] seam between the watch loop and the reload chain

pub mod config;
pub mod event;

pub use config::{ConfigError, LogConfig, ReloaderConfig, ServiceConfig, WatchConfig};
pub use event::{ChangeEvent, Op};

use async_trait::async_trait;
use std::path::Path;

/// Receiver of debounced reload triggers
///
/// The watch loop calls this once per fired debounce window, on the timer's
/// own task. Failures are the handler's to log; nothing is propagated back
/// into the loop.
#[async_trait]
pub trait ReloadHandler: Send + Sync + 'static {
    /// Bring the target service up to date after a change to `trigger`
    async fn reload(&self, trigger: &Path);
}
