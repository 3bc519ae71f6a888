//! postdeploy - post-deployment setup orchestrator for containerized web apps

pub mod cli;
pub mod core;
pub mod execution;
pub mod report;
pub mod runtime;

// Re-export commonly used types
pub use core::config::DeployConfig;
pub use core::{Action, DeployPlan, FailurePolicy, RunStatus, Step, StepState};
pub use execution::{DeployEngine, DeployError, DeployEvent};
pub use runtime::{CommandOutput, CommandRunner, CommandSpec, RunnerError, SubprocessRunner};
