//! Access to external collaborators: processes and the public IP service

pub mod command;
pub mod compose;
pub mod error;
pub mod ip_lookup;
pub mod subprocess;

use async_trait::async_trait;
pub use command::{CommandOutput, CommandSpec};
pub use compose::ComposeCommands;
pub use error::RunnerError;
pub use ip_lookup::{HttpIpLookup, PublicIpLookup};
pub use subprocess::SubprocessRunner;

/// Trait for command execution - allows for different implementations
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion and capture its output
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, RunnerError>;
}

#[async_trait]
impl<T: CommandRunner + ?Sized> CommandRunner for std::sync::Arc<T> {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, RunnerError> {
        (**self).run(command).await
    }
}
