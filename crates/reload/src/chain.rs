//! Ordered fallback over reload strategies
//!
//! Preparatory steps always run and never decide the result. The remaining
//! steps are tried in order until one succeeds; if none does, the chain
//! fails with the last step's error and output.

use crate::command::CommandError;
use crate::strategy::{ReloadContext, ReloadOutcome, ReloadStepError, ReloadStrategy};
use async_trait::async_trait;
use reload_core::ReloadHandler;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Reload pipeline for one service
pub struct ReloadChain {
    service: String,
    steps: Vec<Box<dyn ReloadStrategy>>,
    /// Held for the whole chain when reloads are serialized
    exclusive: Option<Mutex<()>>,
}

impl ReloadChain {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            steps: Vec::new(),
            exclusive: None,
        }
    }

    /// Append a step
    pub fn with_step(mut self, step: impl ReloadStrategy + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Run at most one chain at a time when `serialize` is set
    ///
    /// Off by default: a change arriving mid-reload may start a second
    /// chain while the first is still running.
    pub fn serialized(mut self, serialize: bool) -> Self {
        self.exclusive = serialize.then(|| Mutex::new(()));
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Names of the configured steps, in order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Execute the chain once
    pub async fn execute(&self, ctx: &ReloadContext) -> ReloadOutcome {
        let _exclusive = match &self.exclusive {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        info!("Reloading {}...", self.service);

        let mut last_failure: Option<ReloadStepError> = None;
        for step in &self.steps {
            if let Some(failed) = &last_failure {
                info!(
                    "{} failed, attempting alternative reload method: {}",
                    failed.step,
                    step.name()
                );
            }

            let outcome = step.attempt(ctx).await;

            if step.is_preparatory() {
                match outcome {
                    ReloadOutcome::Succeeded { .. } => debug!("{} succeeded", step.name()),
                    ReloadOutcome::Failed(err) => error!("{}", err),
                }
                continue;
            }

            match outcome {
                ReloadOutcome::Succeeded { .. } => {
                    info!(
                        "{} reload command executed successfully ({})",
                        self.service,
                        outcome.step()
                    );
                    return outcome;
                }
                ReloadOutcome::Failed(err) => {
                    error!("{}", err);
                    last_failure = Some(err);
                }
            }
        }

        ReloadOutcome::Failed(last_failure.unwrap_or_else(|| ReloadStepError {
            step: format!("reload {}", self.service),
            output: String::new(),
            source: CommandError::NoRecoveryStep,
        }))
    }
}

#[async_trait]
impl ReloadHandler for ReloadChain {
    async fn reload(&self, trigger: &Path) {
        let ctx = ReloadContext::new(trigger);

        match self.execute(&ctx).await.into_result() {
            Ok(_) => {
                let changed = trigger
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| trigger.display().to_string());
                info!(
                    "Successfully reloaded {} after detecting changes in {}",
                    self.service, changed
                );
            }
            Err(err) => {
                error!("Error reloading {}: {}", self.service, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Scripted step that records how often it ran
    struct FakeStep {
        name: &'static str,
        preparatory: bool,
        succeed: bool,
        output: &'static str,
        calls: Arc<AtomicUsize>,
        delay: Duration,
        running: Option<Arc<AtomicUsize>>,
        max_running: Option<Arc<AtomicUsize>>,
    }

    impl FakeStep {
        fn new(name: &'static str, succeed: bool, output: &'static str) -> Self {
            Self {
                name,
                preparatory: false,
                succeed,
                output,
                calls: Arc::new(AtomicUsize::new(0)),
                delay: Duration::ZERO,
                running: None,
                max_running: None,
            }
        }

        fn preparatory(mut self) -> Self {
            self.preparatory = true;
            self
        }

        fn counter(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.calls)
        }
    }

    #[async_trait]
    impl ReloadStrategy for FakeStep {
        fn name(&self) -> &str {
            self.name
        }

        fn is_preparatory(&self) -> bool {
            self.preparatory
        }

        async fn attempt(&self, _ctx: &ReloadContext) -> ReloadOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let (Some(running), Some(max)) = (&self.running, &self.max_running) {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                max.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(self.delay).await;
                running.fetch_sub(1, Ordering::SeqCst);
            }

            if self.succeed {
                ReloadOutcome::Succeeded {
                    step: self.name.to_string(),
                    output: self.output.to_string(),
                }
            } else {
                ReloadOutcome::Failed(ReloadStepError {
                    step: self.name.to_string(),
                    output: self.output.to_string(),
                    source: CommandError::Exit {
                        program: self.name.to_string(),
                        code: Some(1),
                    },
                })
            }
        }
    }

    fn ctx() -> ReloadContext {
        ReloadContext::new("/etc/agent/conf.d/a.conf")
    }

    #[tokio::test]
    async fn test_restart_success_skips_signal() {
        let prepare = FakeStep::new("daemon-reload", true, "").preparatory();
        let restart = FakeStep::new("restart", true, "restarted");
        let signal = FakeStep::new("signal", true, "");
        let signal_calls = signal.counter();

        let chain = ReloadChain::new("kubelet")
            .with_step(prepare)
            .with_step(restart)
            .with_step(signal);

        let outcome = chain.execute(&ctx()).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.step(), "restart");
        assert_eq!(signal_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_restart_failure_falls_back_to_signal() {
        let restart = FakeStep::new("restart", false, "Job for kubelet.service failed");
        let signal = FakeStep::new("signal", true, "");
        let signal_calls = signal.counter();

        let chain = ReloadChain::new("kubelet")
            .with_step(FakeStep::new("daemon-reload", true, "").preparatory())
            .with_step(restart)
            .with_step(signal);

        let outcome = chain.execute(&ctx()).await;

        assert_eq!(signal_calls.load(Ordering::SeqCst), 1);
        assert!(outcome.is_success());
        assert_eq!(outcome.step(), "signal");
    }

    #[tokio::test]
    async fn test_all_failures_report_last_step_output() {
        let chain = ReloadChain::new("kubelet")
            .with_step(FakeStep::new("daemon-reload", false, "prepare output").preparatory())
            .with_step(FakeStep::new("restart", false, "restart output"))
            .with_step(FakeStep::new("signal", false, "pkill output"));

        let err = chain.execute(&ctx()).await.into_result().unwrap_err();

        assert_eq!(err.step, "signal");
        assert_eq!(err.output, "pkill output");
        assert!(err.to_string().contains("pkill output"));
        assert!(!err.to_string().contains("restart output"));
    }

    #[tokio::test]
    async fn test_prepare_failure_does_not_abort_chain() {
        let prepare = FakeStep::new("daemon-reload", false, "Access denied").preparatory();
        let restart = FakeStep::new("restart", true, "");
        let restart_calls = restart.counter();

        let chain = ReloadChain::new("kubelet").with_step(prepare).with_step(restart);

        let outcome = chain.execute(&ctx()).await;

        assert!(outcome.is_success());
        assert_eq!(restart_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prepare_success_does_not_stop_chain() {
        let restart = FakeStep::new("restart", false, "");
        let restart_calls = restart.counter();

        let chain = ReloadChain::new("kubelet")
            .with_step(FakeStep::new("daemon-reload", true, "").preparatory())
            .with_step(restart);

        let outcome = chain.execute(&ctx()).await;

        assert!(!outcome.is_success());
        assert_eq!(restart_calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.step(), "restart");
    }

    #[tokio::test]
    async fn test_chain_without_recovery_steps_fails() {
        let chain = ReloadChain::new("kubelet")
            .with_step(FakeStep::new("daemon-reload", true, "").preparatory());

        let err = chain.execute(&ctx()).await.into_result().unwrap_err();

        assert!(matches!(err.source, CommandError::NoRecoveryStep));
    }

    #[tokio::test]
    async fn test_step_names_in_order() {
        let chain = ReloadChain::new("kubelet")
            .with_step(FakeStep::new("a", true, "").preparatory())
            .with_step(FakeStep::new("b", true, ""));

        assert_eq!(chain.service(), "kubelet");
        assert_eq!(chain.step_names(), vec!["a", "b"]);
    }

    fn overlapping_chain(serialize: bool) -> (Arc<ReloadChain>, Arc<AtomicUsize>) {
        let running = Arc::new(AtomicUsize::new(0));
        let max_running = Arc::new(AtomicUsize::new(0));

        let mut step = FakeStep::new("restart", true, "");
        step.delay = Duration::from_secs(5);
        step.running = Some(Arc::clone(&running));
        step.max_running = Some(Arc::clone(&max_running));

        let chain = ReloadChain::new("kubelet").with_step(step).serialized(serialize);
        (Arc::new(chain), max_running)
    }

    #[tokio::test(start_paused = true)]
    async fn test_chains_overlap_by_default() {
        let (chain, max_running) = overlapping_chain(false);

        let first = tokio::spawn({
            let chain = Arc::clone(&chain);
            async move { chain.reload(Path::new("/etc/agent/conf.d/a.conf")).await }
        });
        let second = tokio::spawn({
            let chain = Arc::clone(&chain);
            async move { chain.reload(Path::new("/etc/agent/conf.d/b.conf")).await }
        });
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(max_running.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_serialized_chains_never_overlap() {
        let (chain, max_running) = overlapping_chain(true);

        let first = tokio::spawn({
            let chain = Arc::clone(&chain);
            async move { chain.reload(Path::new("/etc/agent/conf.d/a.conf")).await }
        });
        let second = tokio::spawn({
            let chain = Arc::clone(&chain);
            async move { chain.reload(Path::new("/etc/agent/conf.d/b.conf")).await }
        });
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(max_running.load(Ordering::SeqCst), 1);
    }
}
