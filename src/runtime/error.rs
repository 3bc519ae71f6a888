//! Runner error types

use thiserror::Error;

/// Error types for command execution
///
/// A command that runs and exits non-zero is not an error at this level;
/// it comes back as a [`CommandOutput`](crate::runtime::CommandOutput) with a
/// failing status and the step's failure policy decides what happens.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to spawn `{program}`: {reason}")]
    Spawn { program: String, reason: String },

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Failed to decode output: {0}")]
    Decode(String),
}
