//! systemd + pkill reload steps

use crate::chain::ReloadChain;
use crate::command::CommandStrategy;
use reload_core::ServiceConfig;
use std::time::Duration;

/// `systemctl daemon-reload`, run as best-effort preparation
pub fn daemon_reload() -> CommandStrategy {
    CommandStrategy::new("systemctl", ["daemon-reload"]).preparatory()
}

/// `systemctl restart <unit>`
pub fn restart_unit(unit: &str) -> CommandStrategy {
    CommandStrategy::new("systemctl", ["restart", unit])
}

/// `pkill -<signal> -f <pattern>`
pub fn signal_process(signal: &str, pattern: &str) -> CommandStrategy {
    CommandStrategy::new("pkill", [format!("-{}", signal), "-f".to_string(), pattern.to_string()])
}

impl ReloadChain {
    /// daemon-reload, then restart, then signal the process directly
    pub fn systemd(service: &ServiceConfig, timeout: Option<Duration>) -> Self {
        ReloadChain::new(service.unit.clone())
            .with_step(daemon_reload().with_timeout(timeout))
            .with_step(restart_unit(&service.unit).with_timeout(timeout))
            .with_step(signal_process(&service.signal, &service.process_pattern).with_timeout(timeout))
            .serialized(service.serialize_reloads)
    }
}
