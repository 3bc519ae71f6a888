//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{PlanCommand, RunCommand, ValidateCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Post-deployment setup for a containerized web application
#[derive(Debug, Parser, Clone)]
#[command(name = "postdeploy")]
#[command(version)]
#[command(about = "Warm caches, install the queue dashboard and restart the web container after a deploy", long_about = None)]
pub struct Cli {
    /// Defaults to `run`
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to configuration file (default: ./postdeploy.yaml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the post-deployment setup
    Run(RunCommand),

    /// Print the ordered steps without running them
    Plan(PlanCommand),

    /// Validate the configuration
    Validate(ValidateCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }

    /// The command to execute; no subcommand means a plain run
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Run(RunCommand::default()))
    }
}
