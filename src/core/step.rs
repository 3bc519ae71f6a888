//! Step domain model

use crate::core::config::{Owner, WaitStrategy};
use crate::core::state::StepState;
use crate::runtime::CommandSpec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What happens to the run when a step fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run and exit non-zero
    Abort,
    /// Report the failure and continue
    Warn,
    /// Suppress the failure and continue
    Ignore,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Abort => "abort",
            FailurePolicy::Warn => "warn",
            FailurePolicy::Ignore => "ignore",
        }
    }
}

/// A path whose ownership is changed recursively
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnershipTarget {
    pub path: PathBuf,
    pub owner: Owner,
}

/// Container query used to decide whether a service is Up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunningProbe {
    /// `<compose> ps <service>`
    pub ps: CommandSpec,
    pub service: String,
}

/// The single thing a step does
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// `chown -R` the storage tree, then the nested cache data path.
    /// Absent root: nothing to do.
    FixOwnership {
        root: OwnershipTarget,
        nested: Option<OwnershipTarget>,
    },
    /// Query container state; failure when the service is not Up
    CheckRunning {
        probe: RunningProbe,
        /// Printed with the failure to tell the operator what to do
        hint: Option<String>,
    },
    /// Sleep, or poll until the service is Up
    Wait {
        strategy: WaitStrategy,
        probe: Option<RunningProbe>,
    },
    /// Run one external command; non-zero exit is a failure
    Exec { command: CommandSpec },
    /// Resolve the public IP and render the closing banner
    Banner { title: String, lines: Vec<String> },
}

impl Action {
    /// One-line description for plan listings
    pub fn describe(&self) -> String {
        match self {
            Action::FixOwnership { root, nested } => {
                let mut text = format!("chown -R {} {}", root.owner, root.path.display());
                if let Some(nested) = nested {
                    text.push_str(&format!(
                        "; chown -R {} {}",
                        nested.owner,
                        nested.path.display()
                    ));
                }
                text
            }
            Action::CheckRunning { probe, .. } => {
                format!("{} (expect {} Up)", probe.ps, probe.service)
            }
            Action::Wait { strategy, .. } => match strategy {
                WaitStrategy::Fixed { secs } => format!("sleep {}s", secs),
                WaitStrategy::Poll {
                    timeout_secs,
                    interval_secs,
                } => format!(
                    "poll every {}s for up to {}s",
                    interval_secs, timeout_secs
                ),
            },
            Action::Exec { command } => command.to_string(),
            Action::Banner { lines, .. } => format!("print {} next-step lines", lines.len()),
        }
    }
}

/// A single step in a deployment plan
#[derive(Debug, Clone)]
pub struct Step {
    /// Stable kebab-case identifier
    pub id: String,

    /// Human-readable label
    pub label: String,

    pub action: Action,

    pub policy: FailurePolicy,

    /// Runtime state (not serialized)
    pub state: StepState,
}

impl Step {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        action: Action,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            action,
            policy,
            state: StepState::Pending,
        }
    }

    pub fn is_wait(&self) -> bool {
        matches!(self.action, Action::Wait { .. })
    }
}
