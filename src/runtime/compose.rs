//! Container orchestration CLI command builders

use crate::runtime::CommandSpec;

/// Builds commands against the container group (`docker compose ...`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeCommands {
    program: String,
    base_args: Vec<String>,
}

impl ComposeCommands {
    pub fn new(program: impl Into<String>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
        }
    }

    fn base(&self) -> CommandSpec {
        CommandSpec::new(self.program.clone()).args(self.base_args.iter().cloned())
    }

    /// `<compose> ps <service>`, listing only that service's containers
    pub fn ps(&self, service: &str) -> CommandSpec {
        self.base().args(["ps", service])
    }

    /// `<compose> exec -T <service> <command...>`
    ///
    /// `-T` disables TTY allocation so output can be captured.
    pub fn exec<I, S>(&self, service: &str, command: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base().args(["exec", "-T", service]).args(command)
    }

    /// `<compose> restart <service>`
    pub fn restart(&self, service: &str) -> CommandSpec {
        self.base().args(["restart", service])
    }
}

impl Default for ComposeCommands {
    fn default() -> Self {
        Self::new("docker", vec!["compose".to_string()])
    }
}
