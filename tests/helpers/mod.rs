//! Test utility functions for postdeploy

#![allow(dead_code)]

use postdeploy::core::config::DeployConfig;
use postdeploy::core::{DeployPlan, RunStatus, StepState};
use postdeploy::execution::{DeployEngine, DeployError, DeployEvent};
use postdeploy::runtime::{CommandOutput, CommandRunner, CommandSpec, PublicIpLookup, RunnerError};

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Typical `docker compose ps` output with every service up
pub const PS_ALL_UP: &str = "\
NAME           IMAGE          COMMAND                  SERVICE   CREATED         STATUS         PORTS
shop-app-1     shop-app       \"docker-php-entrypoi…\"   app       2 minutes ago   Up 2 minutes   0.0.0.0:80->80/tcp
shop-redis-1   redis:7        \"docker-entrypoint.s…\"   redis     2 minutes ago   Up 2 minutes   6379/tcp
";

/// `docker compose ps` output with the web container stopped
pub const PS_APP_EXITED: &str = "\
NAME           IMAGE          COMMAND                  SERVICE   CREATED         STATUS                     PORTS
shop-app-1     shop-app       \"docker-php-entrypoi…\"   app       2 minutes ago   Exited (255) 1 minute ago
shop-redis-1   redis:7        \"docker-entrypoint.s…\"   redis     2 minutes ago   Up 2 minutes               6379/tcp
";

/// Web container stopped while siblings built from its image keep running
pub const PS_APP_EXITED_WORKERS_UP: &str = "\
NAME               IMAGE          COMMAND                  SERVICE     CREATED         STATUS                      PORTS
shop-app-1         shop-app       \"docker-php-entrypoi…\"   app         2 minutes ago   Exited (255) 1 minute ago
shop-worker-1      shop-app       \"php artisan horizon\"    worker      2 minutes ago   Up 2 minutes
shop-scheduler-1   shop-app       \"php artisan schedul…\"   scheduler   2 minutes ago   Up 2 minutes
shop-redis-1       redis:7        \"docker-entrypoint.s…\"   redis       2 minutes ago   Up 2 minutes                6379/tcp
";

enum Reply {
    Output(CommandOutput),
    /// Successive answers; the last one repeats
    Sequence(Vec<CommandOutput>, AtomicUsize),
    Error(String),
}

/// Mock runner that answers commands by substring match
///
/// Rules added later take precedence. Anything unmatched succeeds with
/// empty output, except `ps` which reports every service up.
pub struct ScriptedRunner {
    rules: Vec<(String, Reply)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn healthy() -> Self {
        Self {
            rules: vec![(" ps".to_string(), Reply::Output(CommandOutput::success(PS_ALL_UP)))],
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer commands containing `needle` with `output`
    pub fn on(mut self, needle: &str, output: CommandOutput) -> Self {
        self.rules.push((needle.to_string(), Reply::Output(output)));
        self
    }

    /// Make commands containing `needle` exit with `code`
    pub fn failing(self, needle: &str, code: i32, stderr: &str) -> Self {
        self.on(needle, CommandOutput::failure(code, stderr))
    }

    /// Answer successive commands containing `needle` in turn
    pub fn sequence(mut self, needle: &str, outputs: Vec<CommandOutput>) -> Self {
        assert!(!outputs.is_empty());
        self.rules
            .push((needle.to_string(), Reply::Sequence(outputs, AtomicUsize::new(0))));
        self
    }

    /// Make commands containing `needle` fail to spawn
    pub fn unavailable(mut self, needle: &str) -> Self {
        self.rules
            .push((needle.to_string(), Reply::Error("No such file or directory".to_string())));
        self
    }

    /// Every command run so far, rendered as shell text
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_containing(&self, needle: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(needle)).count()
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.calls_containing(needle) > 0
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, RunnerError> {
        let rendered = command.to_string();
        self.calls.lock().unwrap().push(rendered.clone());

        let reply = self
            .rules
            .iter()
            .rev()
            .find(|(needle, _)| rendered.contains(needle.as_str()))
            .map(|(_, reply)| reply);

        match reply {
            Some(Reply::Output(output)) => Ok(output.clone()),
            Some(Reply::Sequence(outputs, next)) => {
                let idx = next.fetch_add(1, Ordering::SeqCst).min(outputs.len() - 1);
                Ok(outputs[idx].clone())
            }
            Some(Reply::Error(reason)) => Err(RunnerError::Spawn {
                program: command.program.clone(),
                reason: reason.clone(),
            }),
            None => Ok(CommandOutput::success("")),
        }
    }
}

/// IP lookup with a canned answer
pub struct FixedIp(pub Option<&'static str>);

#[async_trait]
impl PublicIpLookup for FixedIp {
    async fn lookup(&self) -> Option<String> {
        self.0.map(str::to_string)
    }
}

/// Configuration rooted in `project_dir`, with a storage tree when asked
pub fn test_config(project_dir: &Path, with_storage: bool) -> DeployConfig {
    let mut config = DeployConfig::default();
    config.name = "shop".to_string();
    config.project_dir = project_dir.to_path_buf();
    if with_storage {
        std::fs::create_dir_all(project_dir.join("storage").join("redis")).unwrap();
    }
    config
}

/// Run a plan with a scripted runner and record every event
pub async fn run_plan(
    plan: &mut DeployPlan,
    runner: Arc<ScriptedRunner>,
    ip: FixedIp,
) -> DeployTestResult {
    let events = Arc::new(Mutex::new(Vec::new()));
    let engine = DeployEngine::with_ip_lookup(runner, Arc::new(ip));

    let sink = Arc::clone(&events);
    engine
        .add_event_handler(move |event| sink.lock().unwrap().push(event))
        .await;

    let result = engine.execute(plan).await;
    let events = events.lock().unwrap().clone();

    DeployTestResult {
        plan: plan.clone(),
        result,
        events,
    }
}

/// Test result from running a plan
#[derive(Debug)]
pub struct DeployTestResult {
    pub plan: DeployPlan,
    pub result: Result<(), DeployError>,
    pub events: Vec<DeployEvent>,
}

impl DeployTestResult {
    /// Check if the run completed (exit code zero)
    pub fn is_success(&self) -> bool {
        self.result.is_ok() && self.plan.state.status == RunStatus::Completed
    }

    /// Check if the run aborted (non-zero exit code)
    pub fn is_failed(&self) -> bool {
        self.result.is_err() && self.plan.state.status == RunStatus::Failed
    }

    /// The step that aborted the run, if any
    pub fn failed_step(&self) -> Option<&str> {
        match &self.result {
            Err(DeployError::StepFailed { step, .. }) => Some(step.as_str()),
            _ => None,
        }
    }

    /// Get the state of a specific step
    pub fn step_state(&self, step_id: &str) -> &StepState {
        &self
            .plan
            .step(step_id)
            .unwrap_or_else(|| panic!("No step {}", step_id))
            .state
    }

    /// Steps that were never started
    pub fn pending_steps(&self) -> Vec<String> {
        self.plan
            .steps
            .iter()
            .filter(|s| matches!(s.state, StepState::Pending))
            .map(|s| s.id.clone())
            .collect()
    }

    /// Captured output carried by the StepFailed event
    pub fn failure_output(&self) -> Option<String> {
        self.events.iter().find_map(|e| match e {
            DeployEvent::StepFailed { output, .. } => output.clone(),
            _ => None,
        })
    }

    /// Lines of the closing banner, if it was printed
    pub fn banner_lines(&self) -> Option<Vec<String>> {
        self.events.iter().find_map(|e| match e {
            DeployEvent::Banner { lines, .. } => Some(lines.clone()),
            _ => None,
        })
    }

    /// Get a summary of the result
    pub fn summary(&self) -> String {
        let status = match self.plan.state.status {
            RunStatus::Completed => "✅ Completed",
            RunStatus::Failed => "❌ Failed",
            RunStatus::Running => "🔄 Running",
            RunStatus::Pending => "⏳ Pending",
        };
        let steps: Vec<String> = self
            .plan
            .steps
            .iter()
            .map(|s| format!("  {} [{}]", s.id, s.state.label()))
            .collect();
        format!("{}\n{}", status, steps.join("\n"))
    }
}
