//! Command runner backed by real child processes.

use std::process::{Output, Stdio};

use async_trait::async_trait;
use tracing::{debug, info};

use super::{CommandLine, CommandOutput, CommandRunner};
use crate::error::{BackendError, Result};

/// Spawns commands as child processes of the backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, command: &CommandLine) -> Result<CommandOutput> {
        info!(%command, "Executing command");
        let output = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;
        finish(command, &output)
    }

    fn run_blocking(&self, command: &CommandLine) -> Result<CommandOutput> {
        info!(%command, "Executing command (blocking)");
        let output = std::process::Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .output()?;
        finish(command, &output)
    }
}

fn finish(command: &CommandLine, output: &Output) -> Result<CommandOutput> {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    // Killed by a signal: no exit code.
    let return_code = output.status.code().unwrap_or(-1);

    debug!(%command, return_code, %stdout, %stderr, "Command finished");

    if !output.status.success() {
        return Err(BackendError::ProcessFailed {
            command: command.to_string(),
            code: return_code,
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(CommandOutput {
        return_code,
        stdout,
        stderr,
    })
}
