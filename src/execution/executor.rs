//! Action executor - performs a single step's action against the outside world

use crate::{
    core::{
        config::{Owner, WaitStrategy},
        Action, ContainerStatus, OwnershipTarget, RunContext, RunningProbe,
    },
    runtime::{CommandOutput, CommandRunner, CommandSpec, PublicIpLookup},
};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info, warn};

/// Shown in the banner when the public IP cannot be determined
pub const UNKNOWN_IP: &str = "<server-ip>";

/// Result of performing an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Action completed successfully
    Done { output: String },
    /// Nothing to do
    Skipped { reason: String },
    /// Action failed; `output` carries captured command output if any
    Failed {
        error: String,
        output: Option<String>,
    },
}

impl ActionOutcome {
    fn failed(error: impl Into<String>) -> Self {
        ActionOutcome::Failed {
            error: error.into(),
            output: None,
        }
    }
}

/// Performs actions through a command runner
pub struct ActionExecutor<R> {
    runner: R,
    ip_lookup: Option<Arc<dyn PublicIpLookup>>,
}

impl<R: CommandRunner> ActionExecutor<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            ip_lookup: None,
        }
    }

    pub fn with_ip_lookup(mut self, lookup: Arc<dyn PublicIpLookup>) -> Self {
        self.ip_lookup = Some(lookup);
        self
    }

    /// Perform an action and classify the result
    pub async fn execute(&self, action: &Action, context: &RunContext) -> ActionOutcome {
        match action {
            Action::FixOwnership { root, nested } => self.fix_ownership(root, nested.as_ref()).await,
            Action::CheckRunning { probe, hint } => self.check_running(probe, hint.as_deref()).await,
            Action::Wait { strategy, probe } => self.wait(*strategy, probe.as_ref()).await,
            Action::Exec { command } => self.exec(command).await,
            Action::Banner { lines, .. } => self.banner(lines, context).await,
        }
    }

    /// Run a command; Ok only when it exits zero
    async fn run_checked(&self, command: &CommandSpec) -> Result<CommandOutput, ActionOutcome> {
        match self.runner.run(command).await {
            Ok(output) if output.is_success() => Ok(output),
            Ok(output) => {
                let captured = output.combined();
                Err(ActionOutcome::Failed {
                    error: format!("`{}` exited with code {}", command, output.code_display()),
                    output: (!captured.is_empty()).then_some(captured),
                })
            }
            Err(e) => Err(ActionOutcome::failed(format!("`{}`: {}", command, e))),
        }
    }

    async fn exec(&self, command: &CommandSpec) -> ActionOutcome {
        match self.run_checked(command).await {
            Ok(output) => ActionOutcome::Done {
                output: output.combined(),
            },
            Err(outcome) => outcome,
        }
    }

    async fn fix_ownership(
        &self,
        root: &OwnershipTarget,
        nested: Option<&OwnershipTarget>,
    ) -> ActionOutcome {
        if !root.path.exists() {
            info!("{} does not exist yet, skipping ownership fix", root.path.display());
            return ActionOutcome::Skipped {
                reason: format!("{} does not exist", root.path.display()),
            };
        }

        let mut changed = Vec::new();
        for target in std::iter::once(root).chain(nested) {
            // Absolute, since the runner's working directory is the project dir
            let path = match target.path.canonicalize() {
                Ok(path) => path,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("{} does not exist, skipping", target.path.display());
                    continue;
                }
                Err(e) => {
                    return ActionOutcome::failed(format!(
                        "Cannot resolve {}: {}",
                        target.path.display(),
                        e
                    ))
                }
            };
            let command = chown(&path, target.owner);
            if let Err(outcome) = self.run_checked(&command).await {
                return outcome;
            }
            changed.push(format!("{} -> {}", path.display(), target.owner));
        }

        ActionOutcome::Done {
            output: changed.join("\n"),
        }
    }

    async fn probe(&self, probe: &RunningProbe) -> Result<ContainerStatus, ActionOutcome> {
        let output = self.run_checked(&probe.ps).await.map_err(|outcome| match outcome {
            ActionOutcome::Failed { error, output } => ActionOutcome::Failed {
                error: format!("Could not query container state: {}", error),
                output,
            },
            other => other,
        })?;
        Ok(ContainerStatus::parse(&output.stdout, &probe.service))
    }

    async fn check_running(&self, probe: &RunningProbe, hint: Option<&str>) -> ActionOutcome {
        let status = match self.probe(probe).await {
            Ok(status) => status,
            Err(outcome) => return outcome,
        };

        match status {
            ContainerStatus::Up(line) => ActionOutcome::Done { output: line },
            other => {
                let mut error = format!("Service '{}' is {}", probe.service, other.describe());
                if let Some(hint) = hint {
                    error.push_str(". ");
                    error.push_str(hint);
                }
                ActionOutcome::failed(error)
            }
        }
    }

    async fn wait(&self, strategy: WaitStrategy, probe: Option<&RunningProbe>) -> ActionOutcome {
        match (strategy, probe) {
            (
                WaitStrategy::Poll {
                    timeout_secs,
                    interval_secs,
                },
                Some(probe),
            ) => self.poll_until_up(probe, timeout_secs, interval_secs).await,
            (strategy, _) => {
                let secs = strategy.max_secs();
                debug!("Sleeping {}s", secs);
                sleep(Duration::from_secs(secs)).await;
                ActionOutcome::Done {
                    output: format!("waited {}s", secs),
                }
            }
        }
    }

    async fn poll_until_up(
        &self,
        probe: &RunningProbe,
        timeout_secs: u64,
        interval_secs: u64,
    ) -> ActionOutcome {
        let started = Instant::now();
        let deadline = started + Duration::from_secs(timeout_secs);
        let interval = Duration::from_secs(interval_secs);

        loop {
            match self.probe(probe).await {
                Ok(status) if status.is_up() => {
                    return ActionOutcome::Done {
                        output: format!(
                            "{} up after {}s",
                            probe.service,
                            started.elapsed().as_secs()
                        ),
                    };
                }
                Ok(status) => debug!("{} {}", probe.service, status.describe()),
                Err(outcome) => debug!("Probe failed: {:?}", outcome),
            }

            if Instant::now() + interval > deadline {
                return ActionOutcome::failed(format!(
                    "Service '{}' not up after {}s",
                    probe.service, timeout_secs
                ));
            }
            sleep(interval).await;
        }
    }

    async fn banner(&self, lines: &[String], context: &RunContext) -> ActionOutcome {
        let mut context = context.clone();
        // An explicit --var public_ip=... wins over the lookup
        if !context.variables.contains_key("public_ip") {
            let public_ip = match &self.ip_lookup {
                Some(lookup) => lookup.lookup().await.unwrap_or_else(|| {
                    warn!("Could not determine public IP address");
                    UNKNOWN_IP.to_string()
                }),
                None => UNKNOWN_IP.to_string(),
            };
            context.set_variable("public_ip", public_ip);
        }

        let rendered: Vec<String> = lines.iter().map(|line| context.render(line)).collect();
        ActionOutcome::Done {
            output: rendered.join("\n"),
        }
    }
}

fn chown(path: &Path, owner: Owner) -> CommandSpec {
    CommandSpec::new("chown")
        .arg("-R")
        .arg(owner.to_string())
        .arg(path.to_string_lossy())
}
