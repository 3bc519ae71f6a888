//! Main execution engine - runs the deployment plan step by step

use crate::{
    core::{Action, DeployPlan, FailurePolicy, RunStatus, StepState},
    execution::{ActionExecutor, ActionOutcome, DeployError},
    runtime::{CommandRunner, PublicIpLookup},
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Events that can occur during a deployment run
#[derive(Debug, Clone)]
pub enum DeployEvent {
    RunStarted {
        run_id: Uuid,
        name: String,
        total_steps: usize,
    },
    StepStarted {
        step_id: String,
        label: String,
        index: usize,
        total: usize,
    },
    WaitStarted {
        step_id: String,
        label: String,
        secs: u64,
        polling: bool,
    },
    WaitFinished {
        step_id: String,
    },
    StepSucceeded {
        step_id: String,
        label: String,
        output: String,
    },
    StepSkipped {
        step_id: String,
        label: String,
        reason: String,
    },
    StepWarned {
        step_id: String,
        label: String,
        error: String,
    },
    StepIgnored {
        step_id: String,
        label: String,
        error: String,
    },
    StepFailed {
        step_id: String,
        label: String,
        error: String,
        /// Captured command output, printed for the operator
        output: Option<String>,
    },
    Banner {
        title: String,
        lines: Vec<String>,
    },
    RunFinished {
        run_id: Uuid,
        status: RunStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(DeployEvent) + Send + Sync>;

/// Sequential deployment engine
pub struct DeployEngine<R> {
    executor: Arc<ActionExecutor<R>>,
    event_handlers: Arc<Mutex<Vec<EventHandler>>>,
}

impl<R: CommandRunner + 'static> DeployEngine<R> {
    pub fn new(runner: R) -> Self {
        Self::with_executor(ActionExecutor::new(runner))
    }

    pub fn with_executor(executor: ActionExecutor<R>) -> Self {
        Self {
            executor: Arc::new(executor),
            event_handlers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create an engine whose closing banner resolves the public IP
    pub fn with_ip_lookup(runner: R, lookup: Arc<dyn PublicIpLookup>) -> Self {
        Self::with_executor(ActionExecutor::new(runner).with_ip_lookup(lookup))
    }

    /// Add an event handler
    pub async fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(DeployEvent) + Send + Sync + 'static,
    {
        self.event_handlers.lock().await.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    async fn emit_event(&self, event: DeployEvent) {
        let handlers = self.event_handlers.lock().await;
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }

    /// Execute every step of the plan in order
    ///
    /// Returns an error as soon as an abort-policy step fails; warn and
    /// ignore failures are recorded on the step and the run continues.
    pub async fn execute(&self, plan: &mut DeployPlan) -> Result<(), DeployError> {
        if plan.state.status != RunStatus::Pending {
            return Err(DeployError::AlreadyExecuted(plan.state.run_id));
        }

        let run_id = plan.state.run_id;
        let total = plan.steps.len();

        info!("Starting post-deploy run: {} ({})", plan.name, run_id);
        plan.state.start(total);
        self.emit_event(DeployEvent::RunStarted {
            run_id,
            name: plan.name.clone(),
            total_steps: total,
        })
        .await;

        let context = plan.create_context();

        for index in 0..total {
            let step = plan.steps[index].clone();
            let started_at = Utc::now();
            plan.steps[index].state = StepState::Running { started_at };

            self.emit_event(DeployEvent::StepStarted {
                step_id: step.id.clone(),
                label: step.label.clone(),
                index: index + 1,
                total,
            })
            .await;

            if let Action::Wait { strategy, probe } = &step.action {
                self.emit_event(DeployEvent::WaitStarted {
                    step_id: step.id.clone(),
                    label: step.label.clone(),
                    secs: strategy.max_secs(),
                    polling: probe.is_some(),
                })
                .await;
            }

            debug!("Executing step {}: {}", step.id, step.action.describe());
            let outcome = self.executor.execute(&step.action, &context).await;

            if step.is_wait() {
                self.emit_event(DeployEvent::WaitFinished {
                    step_id: step.id.clone(),
                })
                .await;
            }

            let new_state = match outcome {
                ActionOutcome::Done { output } => {
                    info!("Step {} completed", step.id);
                    if let Action::Banner { title, .. } = &step.action {
                        self.emit_event(DeployEvent::Banner {
                            title: title.clone(),
                            lines: output.lines().map(str::to_string).collect(),
                        })
                        .await;
                    }
                    self.emit_event(DeployEvent::StepSucceeded {
                        step_id: step.id.clone(),
                        label: step.label.clone(),
                        output: output.clone(),
                    })
                    .await;
                    StepState::Succeeded {
                        output,
                        started_at,
                        completed_at: Utc::now(),
                    }
                }
                ActionOutcome::Skipped { reason } => {
                    info!("Step {} skipped: {}", step.id, reason);
                    self.emit_event(DeployEvent::StepSkipped {
                        step_id: step.id.clone(),
                        label: step.label.clone(),
                        reason: reason.clone(),
                    })
                    .await;
                    StepState::Skipped { reason }
                }
                ActionOutcome::Failed { error, output } => match step.policy {
                    FailurePolicy::Abort => {
                        error!("Step {} failed: {}", step.id, error);
                        plan.steps[index].state = StepState::Failed {
                            error: error.clone(),
                            output: output.clone(),
                            started_at,
                            failed_at: Utc::now(),
                        };
                        plan.update_counts();
                        plan.state.fail();

                        self.emit_event(DeployEvent::StepFailed {
                            step_id: step.id.clone(),
                            label: step.label.clone(),
                            error: error.clone(),
                            output,
                        })
                        .await;
                        self.emit_event(DeployEvent::RunFinished {
                            run_id,
                            status: RunStatus::Failed,
                        })
                        .await;

                        return Err(DeployError::StepFailed {
                            step: step.id,
                            error,
                        });
                    }
                    FailurePolicy::Warn => {
                        warn!("Step {} failed (continuing): {}", step.id, error);
                        self.emit_event(DeployEvent::StepWarned {
                            step_id: step.id.clone(),
                            label: step.label.clone(),
                            error: error.clone(),
                        })
                        .await;
                        StepState::Warned {
                            error,
                            completed_at: Utc::now(),
                        }
                    }
                    FailurePolicy::Ignore => {
                        debug!("Step {} failed (ignored): {}", step.id, error);
                        self.emit_event(DeployEvent::StepIgnored {
                            step_id: step.id.clone(),
                            label: step.label.clone(),
                            error: error.clone(),
                        })
                        .await;
                        StepState::Ignored { error }
                    }
                },
            };

            plan.steps[index].state = new_state;
            plan.update_counts();
        }

        plan.state.complete();
        info!("Post-deploy run finished: {} - {:?}", plan.name, plan.state.status);
        self.emit_event(DeployEvent::RunFinished {
            run_id,
            status: RunStatus::Completed,
        })
        .await;

        Ok(())
    }
}
