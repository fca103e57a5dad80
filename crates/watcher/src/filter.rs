//! Reload-worthiness filter for raw change events
//!
//! Only writes and creations of files whose name ends in the config suffix
//! (literal, case-sensitive) are passed on. Everything else is dropped with
//! a low-severity log line.

use reload_core::{ChangeEvent, Op};
use std::path::Path;
use tracing::{debug, info, trace};

/// Suffix used when none is configured
pub const DEFAULT_SUFFIX: &str = ".conf";

/// Filter decision for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Event should (re)arm the reload timer
    Reload,
    /// Operation is neither a write nor a create
    IgnoredOperation,
    /// Path does not carry the config suffix
    IgnoredPath,
}

/// Decides which events warrant a reload
#[derive(Debug, Clone)]
pub struct EventFilter {
    suffix: String,
}

impl EventFilter {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Suffix a path must end with
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Classify an event, logging the decision
    pub fn classify(&self, event: &ChangeEvent) -> Verdict {
        if !event.op.intersects(Op::WRITE | Op::CREATE) {
            trace!("Ignoring {} event on {}", event.op, event.path.display());
            return Verdict::IgnoredOperation;
        }

        info!("Detected change: {}", event);

        if !self.matches_suffix(&event.path) {
            debug!("Ignoring non-config file change: {}", event.path.display());
            return Verdict::IgnoredPath;
        }

        Verdict::Reload
    }

    /// True if the event should trigger a reload
    pub fn is_reload_worthy(&self, event: &ChangeEvent) -> bool {
        self.classify(event) == Verdict::Reload
    }

    fn matches_suffix(&self, path: &Path) -> bool {
        path.to_string_lossy().ends_with(&self.suffix)
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SUFFIX)
    }
}
