//! Watch session errors

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which watcher stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Events,
    Errors,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Events => f.write_str("event"),
            StreamKind::Errors => f.write_str("error"),
        }
    }
}

/// Session-fatal watch errors
///
/// Per-notification backend errors are not represented here; they arrive
/// on the error stream and are only logged.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("config directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),

    #[error("failed to create watcher")]
    Init(#[source] notify::Error),

    #[error("failed to watch directory {}", .path.display())]
    Register {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("watcher {0} channel closed")]
    StreamClosed(StreamKind),
}

impl WatchError {
    /// True for failures that happened before any event was consumed
    pub fn is_setup(&self) -> bool {
        !matches!(self, WatchError::StreamClosed(_))
    }
}
