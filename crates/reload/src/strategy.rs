//! Reload strategy seam

use crate::command::CommandError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What a strategy knows about the reload it is part of
#[derive(Debug, Clone)]
pub struct ReloadContext {
    /// Last changed file in the debounce window
    trigger: PathBuf,
}

impl ReloadContext {
    pub fn new(trigger: impl Into<PathBuf>) -> Self {
        Self {
            trigger: trigger.into(),
        }
    }

    pub fn trigger(&self) -> &Path {
        &self.trigger
    }
}

/// A failed reload step, with the diagnostics it produced
#[derive(Debug, Error)]
#[error("{step} failed: {source}, output: {}", .output.trim())]
pub struct ReloadStepError {
    /// Step name, e.g. "systemctl restart kubelet"
    pub step: String,
    /// Combined stdout/stderr of the step
    pub output: String,
    pub source: CommandError,
}

/// Result of one step, or of a whole chain
#[derive(Debug)]
pub enum ReloadOutcome {
    Succeeded { step: String, output: String },
    Failed(ReloadStepError),
}

impl ReloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ReloadOutcome::Succeeded { .. })
    }

    /// Name of the step that produced this outcome
    pub fn step(&self) -> &str {
        match self {
            ReloadOutcome::Succeeded { step, .. } => step,
            ReloadOutcome::Failed(err) => &err.step,
        }
    }

    /// Captured diagnostic output
    pub fn output(&self) -> &str {
        match self {
            ReloadOutcome::Succeeded { output, .. } => output,
            ReloadOutcome::Failed(err) => &err.output,
        }
    }

    pub fn into_result(self) -> Result<String, ReloadStepError> {
        match self {
            ReloadOutcome::Succeeded { output, .. } => Ok(output),
            ReloadOutcome::Failed(err) => Err(err),
        }
    }
}

/// One way of bringing the service's configuration up to date
#[async_trait]
pub trait ReloadStrategy: Send + Sync {
    /// Human-readable step name used in logs and errors
    fn name(&self) -> &str;

    /// Preparatory steps run unconditionally; their outcome never decides
    /// the chain's result.
    fn is_preparatory(&self) -> bool {
        false
    }

    async fn attempt(&self, ctx: &ReloadContext) -> ReloadOutcome;
}
