//! Reloader process lifecycle
//!
//! Runs the watch session on a background task and waits for either a
//! termination signal (clean exit) or a session-fatal error (error exit).

use anyhow::{Context, Result};
use reload::ReloadChain;
use reload_core::ReloaderConfig;
use std::sync::Arc;
use tracing::{error, info};
use watcher::{EventFilter, WatchSession};

/// Run until SIGINT/SIGTERM or a fatal watch error
pub async fn run(config: ReloaderConfig) -> Result<()> {
    info!("Agent config reloader starting...");
    info!("Watching config path: {}", config.watch.path.display());

    // Installed before the session starts so an early signal is never lost
    let mut shutdown = ShutdownSignals::install()?;

    let chain = ReloadChain::systemd(&config.service, config.command_timeout());
    info!("Reload chain for {}: {}", chain.service(), chain.step_names().join(" -> "));

    let session = WatchSession::new(
        config.watch.path.clone(),
        EventFilter::new(config.watch.suffix.clone()),
        config.debounce_delay(),
        Arc::new(chain),
    );
    let mut session_task = tokio::spawn(session.run());

    tokio::select! {
        signal = shutdown.recv() => {
            info!("Received {}, shutting down gracefully...", signal);
            session_task.abort();
        }
        joined = &mut session_task => {
            let err = match joined.context("Watch session task failed")? {
                Ok(never) => match never {},
                Err(err) => err,
            };
            error!("Fatal error: {}", err);
            return Err(err).context("Fatal error");
        }
    }

    info!("Agent config reloader stopped");
    Ok(())
}

#[cfg(unix)]
struct ShutdownSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?,
            terminate: signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}

#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "Ctrl-C",
            Err(e) => {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending().await
            }
        }
    }
}
