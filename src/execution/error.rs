//! Deployment run errors

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DeployError {
    /// An abort-policy step failed; the run stopped
    #[error("Step '{step}' failed: {error}")]
    StepFailed { step: String, error: String },

    #[error("Plan already executed (run {0}); build a fresh plan to run again")]
    AlreadyExecuted(Uuid),
}
