use anyhow::{Context, Result};
use indicatif::ProgressBar;
use postdeploy::cli::commands::{PlanCommand, RunCommand, ValidateCommand};
use postdeploy::cli::output::*;
use postdeploy::cli::{Cli, Command};
use postdeploy::core::config::DeployConfig;
use postdeploy::execution::{DeployEngine, DeployEvent};
use postdeploy::report::{create_summary, write_summary};
use postdeploy::runtime::{HttpIpLookup, SubprocessRunner};
use std::sync::{Arc, Mutex};
use tracing::{error, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match cli.command() {
        Command::Run(cmd) => run(&cmd, &cli).await?,
        Command::Plan(cmd) => show_plan(&cmd, &cli)?,
        Command::Validate(cmd) => validate(&cmd, &cli)?,
    }

    Ok(())
}

async fn run(cmd: &RunCommand, cli: &Cli) -> Result<()> {
    let config = DeployConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let mut plan = config.to_plan();

    for (key, value) in &cmd.variable {
        plan.set_variable(key.clone(), value.clone());
        println!(
            "{} Variable override: {} = {}",
            INFO,
            style(key).cyan(),
            style(value).dim()
        );
    }

    let runner = SubprocessRunner::new(config.command_timeout_secs)
        .with_working_dir(&config.project_dir);

    let engine = if config.ip_lookup.enabled && !cmd.no_ip_lookup {
        let lookup = HttpIpLookup::new(config.ip_lookup.url.clone(), config.ip_lookup.timeout_secs);
        DeployEngine::with_ip_lookup(runner, Arc::new(lookup))
    } else {
        DeployEngine::new(runner)
    };

    // Console output, with a spinner while waiting
    let verbose = cli.verbose;
    let spinner: Mutex<Option<ProgressBar>> = Mutex::new(None);
    engine
        .add_event_handler(move |event| {
            let Ok(mut active) = spinner.lock() else {
                return;
            };
            match &event {
                DeployEvent::WaitStarted {
                    label,
                    secs,
                    polling,
                    ..
                } => {
                    let message = if *polling {
                        format!("{} (up to {}s)", label, secs)
                    } else {
                        format!("{} ({}s)", label, secs)
                    };
                    *active = Some(create_wait_spinner(message));
                }
                DeployEvent::WaitFinished { .. } => {
                    if let Some(bar) = active.take() {
                        bar.finish_and_clear();
                    }
                }
                other => {
                    if let Some(line) = format_deploy_event(other, verbose) {
                        match active.as_ref() {
                            Some(bar) => bar.println(line),
                            None => println!("{}", line),
                        }
                    }
                }
            }
        })
        .await;

    println!();
    let result = engine.execute(&mut plan).await;

    if let Some(path) = &cmd.report {
        write_summary(&create_summary(&plan), path)?;
        println!("{} Run report written to {}", INFO, style(path.display()).dim());
    }

    match result {
        Ok(()) => {
            println!(
                "\n{} {} completed {}",
                CHECK,
                style(&plan.name).bold(),
                style("successfully").green()
            );
            Ok(())
        }
        Err(e) => {
            println!(
                "\n{} {} {}",
                CROSS,
                style(&plan.name).bold(),
                style("failed").red()
            );
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn show_plan(cmd: &PlanCommand, cli: &Cli) -> Result<()> {
    let config = DeployConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let plan = config.to_plan();

    if cmd.json {
        let steps: Vec<_> = plan
            .steps
            .iter()
            .map(|step| {
                serde_json::json!({
                    "id": step.id,
                    "label": step.label,
                    "policy": step.policy,
                    "action": step.action,
                })
            })
            .collect();
        let data = serde_json::json!({ "name": plan.name, "steps": steps });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        print!("{}", format_plan(&plan));
    }

    Ok(())
}

fn validate(cmd: &ValidateCommand, cli: &Cli) -> Result<()> {
    println!("{} Validating configuration...", INFO);

    match DeployConfig::load(cli.config.as_deref()) {
        Ok(config) => {
            println!("{} Configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Web service: {}", style(&config.web_service).cyan());
            println!("  Cache service: {}", style(&config.cache_service).cyan());
            println!("  Steps: {}", style(config.to_plan().steps.len()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}
