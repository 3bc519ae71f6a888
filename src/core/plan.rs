//! Deployment plan - the ordered list of post-setup steps

use crate::core::{
    config::{DeployConfig, WaitStrategy},
    context::RunContext,
    state::{RunState, RunStatus, StepState},
    step::{Action, FailurePolicy, OwnershipTarget, RunningProbe, Step},
};
use std::collections::HashMap;

/// An ordered deployment plan
#[derive(Debug, Clone)]
pub struct DeployPlan {
    pub name: String,

    /// Variables available to banner lines
    pub variables: HashMap<String, String>,

    /// Steps in execution order
    pub steps: Vec<Step>,

    pub state: RunState,
}

impl DeployPlan {
    /// Build the standard post-setup sequence from configuration
    pub fn from_config(config: &DeployConfig) -> Self {
        let compose = config.compose_commands();
        let web = config.web_service.as_str();
        let probe = RunningProbe {
            ps: compose.ps(web),
            service: config.web_service.clone(),
        };
        let app = |subcommand: &[&str]| Action::Exec {
            command: compose.exec(web, config.app_command(subcommand.iter().copied())),
        };
        let cache_store = |args: &[&str]| Action::Exec {
            command: compose.exec(
                &config.cache_service,
                std::iter::once("redis-cli").chain(args.iter().copied()),
            ),
        };

        let storage_root = config.storage_root();
        let nested = config
            .storage
            .cache_subpath
            .as_ref()
            .map(|sub| OwnershipTarget {
                path: storage_root.join(sub),
                owner: config.storage.cache_owner,
            });

        let init_probe = match config.waits.init {
            WaitStrategy::Poll { .. } => Some(probe.clone()),
            WaitStrategy::Fixed { .. } => None,
        };

        let steps = vec![
            Step::new(
                "fix-storage-ownership",
                "Fix storage ownership",
                Action::FixOwnership {
                    root: OwnershipTarget {
                        path: storage_root,
                        owner: config.storage.owner,
                    },
                    nested,
                },
                FailurePolicy::Abort,
            ),
            Step::new(
                "check-containers",
                "Check containers are running",
                Action::CheckRunning {
                    probe: probe.clone(),
                    hint: Some(format!(
                        "Start the stack first: {} up -d",
                        compose_prefix(config)
                    )),
                },
                FailurePolicy::Abort,
            ),
            Step::new(
                "wait-for-init",
                "Wait for container init scripts",
                Action::Wait {
                    strategy: config.waits.init,
                    probe: init_probe,
                },
                FailurePolicy::Abort,
            ),
            Step::new(
                "cache-store-stop-writes",
                "Disable cache store stop-writes-on-bgsave-error",
                cache_store(&["CONFIG", "SET", "stop-writes-on-bgsave-error", "no"]),
                FailurePolicy::Ignore,
            ),
            Step::new(
                "cache-store-snapshots",
                "Disable cache store snapshotting",
                cache_store(&["CONFIG", "SET", "save", ""]),
                FailurePolicy::Ignore,
            ),
            Step::new(
                "cache-config",
                "Cache configuration",
                app(&["config:cache"]),
                FailurePolicy::Abort,
            ),
            Step::new(
                "cache-routes",
                "Cache routes",
                app(&["route:cache"]),
                FailurePolicy::Abort,
            ),
            Step::new(
                "cache-views",
                "Cache views",
                app(&["view:cache"]),
                FailurePolicy::Abort,
            ),
            Step::new(
                "package-discover",
                "Discover packages",
                app(&["package:discover"]),
                FailurePolicy::Abort,
            ),
            Step::new(
                "queue-dashboard-install",
                "Install queue dashboard",
                Action::Exec {
                    command: compose.exec(
                        web,
                        config.app_command(config.queue_dashboard_install.iter().cloned()),
                    ),
                },
                FailurePolicy::Warn,
            ),
            Step::new(
                "rebuild-routes",
                "Rebuild route cache",
                app(&["route:cache"]),
                FailurePolicy::Abort,
            ),
            Step::new(
                "restart-web",
                "Restart web container",
                Action::Exec {
                    command: compose.restart(web),
                },
                FailurePolicy::Abort,
            ),
            Step::new(
                "settle-after-restart",
                "Let the web container settle",
                Action::Wait {
                    strategy: WaitStrategy::fixed(config.waits.after_restart_secs),
                    probe: None,
                },
                FailurePolicy::Abort,
            ),
            Step::new(
                "pause-before-verify",
                "Pause before verification",
                Action::Wait {
                    strategy: WaitStrategy::fixed(config.waits.before_verify_secs),
                    probe: None,
                },
                FailurePolicy::Abort,
            ),
            Step::new(
                "verify-containers",
                "Verify containers are running",
                Action::CheckRunning {
                    probe,
                    hint: Some(format!(
                        "Inspect logs: {} logs {}",
                        compose_prefix(config),
                        web
                    )),
                },
                FailurePolicy::Warn,
            ),
            Step::new(
                "closing-banner",
                "Print next steps",
                Action::Banner {
                    title: config.banner.title.clone(),
                    lines: config.banner.next_steps.clone(),
                },
                FailurePolicy::Ignore,
            ),
        ];

        let mut variables = HashMap::new();
        variables.insert("web_service".to_string(), config.web_service.clone());
        variables.insert("cache_service".to_string(), config.cache_service.clone());
        variables.extend(config.variables.clone());

        DeployPlan {
            name: config.name.clone(),
            variables,
            steps,
            state: RunState::new(),
        }
    }

    /// Get a step by ID
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Get a mutable step by ID
    pub fn step_mut(&mut self, id: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    /// Step IDs in execution order
    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id.as_str()).collect()
    }

    /// Check if every step reached a terminal state
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.state.is_terminal())
    }

    pub fn has_failed(&self) -> bool {
        self.state.status == RunStatus::Failed
    }

    /// Override or add banner variables
    pub fn set_variable(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Create the run context for executing this plan
    pub fn create_context(&self) -> RunContext {
        RunContext::new(self.variables.clone())
    }

    /// Recount finished and degraded steps
    pub fn update_counts(&mut self) {
        self.state.finished_steps = self.steps.iter().filter(|s| s.state.is_terminal()).count();
        self.state.degraded_steps = self
            .steps
            .iter()
            .filter(|s| matches!(s.state, StepState::Warned { .. } | StepState::Ignored { .. }))
            .count();
    }
}

fn compose_prefix(config: &DeployConfig) -> String {
    std::iter::once(config.compose.program.as_str())
        .chain(config.compose.args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
