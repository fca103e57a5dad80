//! External command execution for reload steps

use crate::strategy::{ReloadContext, ReloadOutcome, ReloadStepError, ReloadStrategy};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Why an external command did not succeed
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to execute {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}", exit_label(.code))]
    Exit { program: String, code: Option<i32> },

    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    #[error("no recovery step configured")]
    NoRecoveryStep,
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "termination by signal".to_string(),
    }
}

/// Reload step backed by an external program
#[derive(Debug, Clone)]
pub struct CommandStrategy {
    name: String,
    program: String,
    args: Vec<String>,
    preparatory: bool,
    timeout: Option<Duration>,
}

impl CommandStrategy {
    /// Step named after its command line
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let program = program.into();
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let name = std::iter::once(program.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            name,
            program,
            args,
            preparatory: false,
            timeout: None,
        }
    }

    /// Mark as best-effort preparation
    pub fn preparatory(mut self) -> Self {
        self.preparatory = true;
        self
    }

    /// Kill the command if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the command to completion
    ///
    /// stdout and stderr are read from separate pipes, so the returned text is
    /// all of stdout followed by all of stderr rather than their interleaving.
    async fn execute(&self) -> (String, Result<(), CommandError>) {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, command.output()).await {
                Ok(output) => output,
                Err(_) => {
                    return (
                        String::new(),
                        Err(CommandError::TimedOut {
                            program: self.program.clone(),
                            timeout: limit,
                        }),
                    )
                }
            },
            None => command.output().await,
        };

        let output = match output {
            Ok(output) => output,
            Err(source) => {
                return (
                    String::new(),
                    Err(CommandError::Spawn {
                        program: self.program.clone(),
                        source,
                    }),
                )
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            (combined, Ok(()))
        } else {
            (
                combined,
                Err(CommandError::Exit {
                    program: self.program.clone(),
                    code: output.status.code(),
                }),
            )
        }
    }
}

#[async_trait]
impl ReloadStrategy for CommandStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_preparatory(&self) -> bool {
        self.preparatory
    }

    async fn attempt(&self, ctx: &ReloadContext) -> ReloadOutcome {
        info!("Running {} (changed: {})", self.name, ctx.trigger().display());

        let (output, status) = self.execute().await;
        match status {
            Ok(()) => {
                debug!("{} succeeded, output: {}", self.name, output.trim());
                ReloadOutcome::Succeeded {
                    step: self.name.clone(),
                    output,
                }
            }
            Err(source) => ReloadOutcome::Failed(ReloadStepError {
                step: self.name.clone(),
                output,
                source,
            }),
        }
    }
}
