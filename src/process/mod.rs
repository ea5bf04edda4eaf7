//! External command execution.
//!
//! Adapters never spawn processes directly. They go through a
//! [`CommandRunner`] so tests can script the output of tools like `ddcutil`
//! without the tools being installed.

pub mod mock;
mod system;

pub use system::SystemRunner;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Program plus arguments, executed without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a command that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub return_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            return_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }
}

/// Runs external commands and captures their output.
///
/// A non-zero exit status is reported as
/// [`BackendError::ProcessFailed`](crate::error::BackendError::ProcessFailed).
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command without blocking the async runtime.
    async fn run(&self, command: &CommandLine) -> Result<CommandOutput>;

    /// Run the command on the calling thread.
    fn run_blocking(&self, command: &CommandLine) -> Result<CommandOutput>;
}

#[async_trait]
impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    async fn run(&self, command: &CommandLine) -> Result<CommandOutput> {
        (**self).run(command).await
    }

    fn run_blocking(&self, command: &CommandLine) -> Result<CommandOutput> {
        (**self).run_blocking(command)
    }
}
