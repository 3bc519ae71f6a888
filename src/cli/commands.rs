//! CLI command definitions

use clap::Args;
use std::path::PathBuf;

/// Run the post-deployment setup
#[derive(Debug, Args, Clone, Default)]
pub struct RunCommand {
    /// Banner variable overrides (key=value)
    #[arg(long = "var", value_parser = parse_key_value)]
    pub variable: Vec<(String, String)>,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Skip the public IP lookup in the closing banner
    #[arg(long)]
    pub no_ip_lookup: bool,
}

/// Print the ordered steps without running them
#[derive(Debug, Args, Clone)]
pub struct PlanCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Validate the configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Dump the effective configuration as JSON
    #[arg(long)]
    pub json: bool,
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 || parts[0].is_empty() {
        return Err(format!("Invalid key=value pair: {}", s));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}
