//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run has not started
    Pending,
    /// Run is in progress
    Running,
    /// Every step finished without an abort
    Completed,
    /// An abort-policy step failed
    Failed,
}

/// State of a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StepState {
    /// Not started yet
    Pending,
    /// Currently running
    Running {
        started_at: DateTime<Utc>,
    },
    /// Finished successfully
    Succeeded {
        output: String,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// Nothing to do (e.g. storage directory absent on first run)
    Skipped {
        reason: String,
    },
    /// Failed under a warn policy; the run continued
    Warned {
        error: String,
        completed_at: DateTime<Utc>,
    },
    /// Failed under an ignore policy; the run continued
    Ignored {
        error: String,
    },
    /// Failed under an abort policy; the run stopped here
    Failed {
        error: String,
        output: Option<String>,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
}

impl StepState {
    /// Check if step is in a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepState::Pending | StepState::Running { .. })
    }

    /// Short lowercase label for reports
    pub fn label(&self) -> &'static str {
        match self {
            StepState::Pending => "pending",
            StepState::Running { .. } => "running",
            StepState::Succeeded { .. } => "succeeded",
            StepState::Skipped { .. } => "skipped",
            StepState::Warned { .. } => "warned",
            StepState::Ignored { .. } => "ignored",
            StepState::Failed { .. } => "failed",
        }
    }

    /// Error message, if the step failed in any way
    pub fn error(&self) -> Option<&str> {
        match self {
            StepState::Warned { error, .. }
            | StepState::Ignored { error }
            | StepState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Overall run state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Unique run ID
    pub run_id: Uuid,

    pub status: RunStatus,

    pub started_at: Option<DateTime<Utc>>,

    /// When the run completed or failed
    pub completed_at: Option<DateTime<Utc>>,

    pub total_steps: usize,

    /// Steps that reached a terminal state
    pub finished_steps: usize,

    /// Steps that ended warned or ignored
    pub degraded_steps: usize,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: RunStatus::Pending,
            started_at: None,
            completed_at: None,
            total_steps: 0,
            finished_steps: 0,
            degraded_steps: 0,
        }
    }

    /// Mark run as started
    pub fn start(&mut self, total_steps: usize) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
        self.total_steps = total_steps;
    }

    /// Mark run as completed
    pub fn complete(&mut self) {
        self.status = RunStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark run as failed
    pub fn fail(&mut self) {
        self.status = RunStatus::Failed;
        self.completed_at = Some(Utc::now());
    }

    /// Calculate progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        self.finished_steps as f64 / self.total_steps as f64
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
