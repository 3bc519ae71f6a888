//! Run report - JSON summary of a finished run

use crate::core::{DeployPlan, FailurePolicy, RunStatus};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Summary of a deployment run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,

    pub name: String,

    pub status: RunStatus,

    pub started_at: Option<DateTime<Utc>>,

    pub completed_at: Option<DateTime<Utc>>,

    /// Progress (0.0 to 1.0)
    pub progress: f64,

    pub steps: Vec<StepSummary>,
}

/// Outcome of one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSummary {
    pub id: String,
    pub label: String,
    pub policy: FailurePolicy,
    pub outcome: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Create a summary from a plan
pub fn create_summary(plan: &DeployPlan) -> RunSummary {
    RunSummary {
        run_id: plan.state.run_id,
        name: plan.name.clone(),
        status: plan.state.status,
        started_at: plan.state.started_at,
        completed_at: plan.state.completed_at,
        progress: plan.state.progress(),
        steps: plan
            .steps
            .iter()
            .map(|step| StepSummary {
                id: step.id.clone(),
                label: step.label.clone(),
                policy: step.policy,
                outcome: step.state.label().to_string(),
                error: step.state.error().map(str::to_string),
            })
            .collect(),
    }
}

/// Write the summary as pretty JSON
pub fn write_summary(summary: &RunSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write run report to {}", path.display()))
}
