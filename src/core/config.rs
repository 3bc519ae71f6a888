//! Deployment configuration from YAML

use crate::core::DeployPlan;
use crate::runtime::ComposeCommands;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "postdeploy.yaml";

/// Top-level deployment configuration
///
/// Every field has a default, so an empty document (or no file at all)
/// describes the standard setup: `docker compose`, an `app` web service
/// and a `redis` cache/queue service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Name shown in output and reports
    pub name: String,

    /// Compose project directory; commands run from here
    pub project_dir: PathBuf,

    /// Container orchestration CLI prefix
    pub compose: ComposeConfig,

    /// Primary web container service name
    pub web_service: String,

    /// Cache/queue store service name
    pub cache_service: String,

    /// Application CLI inside the web container
    pub app_cli: Vec<String>,

    /// Storage ownership fix-up
    pub storage: StorageConfig,

    /// Delays between phases
    pub waits: WaitConfig,

    /// Queue dashboard install subcommand (appended to `app_cli`)
    pub queue_dashboard_install: Vec<String>,

    /// Timeout for each external command (seconds)
    pub command_timeout_secs: u64,

    /// Public IP lookup for the closing banner
    pub ip_lookup: IpLookupConfig,

    /// Closing banner
    pub banner: BannerConfig,

    /// User variables available to banner lines as `{{ name }}`
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    pub program: String,
    pub args: Vec<String>,
}

/// Numeric owner/group pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub uid: u32,
    pub gid: u32,
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.uid, self.gid)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage tree, relative to `project_dir` unless absolute
    pub path: PathBuf,

    /// Owner applied recursively to the whole tree
    pub owner: Owner,

    /// Cache service data directory, relative to `path`
    pub cache_subpath: Option<PathBuf>,

    /// Owner of the cache service data directory
    pub cache_owner: Owner,
}

/// How to wait for something to settle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitStrategy {
    /// Unconditional sleep
    Fixed { secs: u64 },
    /// Re-query container state until the web service is Up
    Poll { timeout_secs: u64, interval_secs: u64 },
}

impl WaitStrategy {
    pub fn fixed(secs: u64) -> Self {
        WaitStrategy::Fixed { secs }
    }

    /// Upper bound of the wait in seconds
    pub fn max_secs(&self) -> u64 {
        match self {
            WaitStrategy::Fixed { secs } => *secs,
            WaitStrategy::Poll { timeout_secs, .. } => *timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Wait for in-container init scripts after the first status check
    pub init: WaitStrategy,

    /// Pause after restarting the web container
    pub after_restart_secs: u64,

    /// Pause before the final liveness check
    pub before_verify_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpLookupConfig {
    pub enabled: bool,
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BannerConfig {
    pub title: String,
    pub next_steps: Vec<String>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            name: "deployment".to_string(),
            project_dir: PathBuf::from("."),
            compose: ComposeConfig::default(),
            web_service: "app".to_string(),
            cache_service: "redis".to_string(),
            app_cli: vec!["php".to_string(), "artisan".to_string()],
            storage: StorageConfig::default(),
            waits: WaitConfig::default(),
            queue_dashboard_install: vec!["horizon:install".to_string()],
            command_timeout_secs: 600,
            ip_lookup: IpLookupConfig::default(),
            banner: BannerConfig::default(),
            variables: HashMap::new(),
        }
    }
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
            args: vec!["compose".to_string()],
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("storage"),
            owner: Owner { uid: 1000, gid: 1000 },
            cache_subpath: Some(PathBuf::from("redis")),
            cache_owner: Owner { uid: 999, gid: 999 },
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            init: WaitStrategy::fixed(60),
            after_restart_secs: 3,
            before_verify_secs: 5,
        }
    }
}

impl Default for IpLookupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "https://api.ipify.org".to_string(),
            timeout_secs: 5,
        }
    }
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            title: "Post-deployment setup complete".to_string(),
            next_steps: vec![
                "Open http://{{ public_ip }} in a browser to check the application".to_string(),
                "Queue dashboard: http://{{ public_ip }}/horizon".to_string(),
                "Follow logs: docker compose logs -f {{ web_service }}".to_string(),
                "Point your DNS records at {{ public_ip }} and enable TLS".to_string(),
            ],
        }
    }
}

impl DeployConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty mapping
        let config: DeployConfig = if yaml.trim().is_empty() {
            DeployConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration for a run
    ///
    /// An explicit path must exist. Without one, `postdeploy.yaml` in the
    /// working directory is used if present, otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.compose.program.trim().is_empty() {
            anyhow::bail!("compose.program must not be empty");
        }
        if self.web_service.trim().is_empty() {
            anyhow::bail!("web_service must not be empty");
        }
        if self.cache_service.trim().is_empty() {
            anyhow::bail!("cache_service must not be empty");
        }
        if self.app_cli.is_empty() {
            anyhow::bail!("app_cli must name the application CLI (e.g. [php, artisan])");
        }
        if self.queue_dashboard_install.is_empty() {
            anyhow::bail!("queue_dashboard_install must not be empty");
        }
        if self.command_timeout_secs == 0 {
            anyhow::bail!("command_timeout_secs must be greater than zero");
        }

        if let Some(sub) = &self.storage.cache_subpath {
            if sub.as_os_str().is_empty() {
                anyhow::bail!("storage.cache_subpath must not be empty");
            }
            if sub.is_absolute() {
                anyhow::bail!(
                    "storage.cache_subpath must be relative to storage.path, got {}",
                    sub.display()
                );
            }
        }

        if let WaitStrategy::Poll {
            timeout_secs,
            interval_secs,
        } = self.waits.init
        {
            if interval_secs == 0 {
                anyhow::bail!("waits.init.poll.interval_secs must be greater than zero");
            }
            if interval_secs > timeout_secs {
                anyhow::bail!(
                    "waits.init.poll.interval_secs ({}) exceeds timeout_secs ({})",
                    interval_secs,
                    timeout_secs
                );
            }
        }

        if self.ip_lookup.enabled && self.ip_lookup.url.trim().is_empty() {
            anyhow::bail!("ip_lookup.url must be set when ip_lookup is enabled");
        }

        Ok(())
    }

    /// Compose command builder for this configuration
    pub fn compose_commands(&self) -> ComposeCommands {
        ComposeCommands::new(self.compose.program.clone(), self.compose.args.clone())
    }

    /// Storage root resolved against the project directory
    pub fn storage_root(&self) -> PathBuf {
        self.project_dir.join(&self.storage.path)
    }

    /// Full application CLI invocation for a subcommand
    pub fn app_command<I, S>(&self, subcommand: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.app_cli
            .iter()
            .cloned()
            .chain(subcommand.into_iter().map(Into::into))
            .collect()
    }

    /// Convert config to a deployment plan
    pub fn to_plan(&self) -> DeployPlan {
        DeployPlan::from_config(self)
    }
}
