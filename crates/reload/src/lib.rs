//! Service reload strategies for the agent reloader
//!
//! This crate provides:
//! - The [`ReloadStrategy`] seam and its external-command implementation
//! - [`ReloadChain`], an ordered fallback over strategies
//! - systemd/pkill strategy builders for the target service

pub mod chain;
pub mod command;
pub mod strategy;
pub mod systemd;

pub use chain::ReloadChain;
pub use command::{CommandError, CommandStrategy};
pub use strategy::{ReloadContext, ReloadOutcome, ReloadStepError, ReloadStrategy};
