//! Subprocess runner - executes commands on the host

use crate::runtime::{CommandOutput, CommandRunner, CommandSpec, RunnerError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Runs commands as child processes of this one
#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    /// Timeout for each command in seconds
    timeout_secs: u64,

    /// Working directory for every command (compose project directory)
    working_dir: Option<PathBuf>,
}

impl SubprocessRunner {
    /// Create a new subprocess runner
    ///
    /// # Arguments
    /// * `timeout_secs` - Timeout for each command in seconds
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout_secs,
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[cfg(test)]
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}

#[async_trait]
impl CommandRunner for SubprocessRunner {
    /// Spawn the command, wait for it and capture both streams
    ///
    /// # Errors
    /// Returns `RunnerError` if:
    /// - The executable cannot be spawned
    /// - The command times out
    /// - The output is not valid UTF-8
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunnerError> {
        debug!("Spawning: {}", spec);

        let mut command = Command::new(&spec.program);
        command.args(&spec.args).kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let result = timeout(Duration::from_secs(self.timeout_secs), command.output())
            .await
            .map_err(|_| RunnerError::Timeout(self.timeout_secs))?;

        let output = result.map_err(|e| RunnerError::Spawn {
            program: spec.program.clone(),
            reason: e.to_string(),
        })?;

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| RunnerError::Decode(e.to_string()))?;
        // stderr is diagnostic only, tolerate garbage
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            warn!(
                "`{}` exited with code {:?}: {}",
                spec,
                output.status.code(),
                stderr.trim()
            );
        }

        debug!("`{}` returned {} bytes of output", spec.program, stdout.len());

        Ok(CommandOutput {
            code: output.status.code(),
            stdout,
            stderr,
        })
    }
}
