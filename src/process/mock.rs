//! Scripted command runner for testing without external tools.
//!
//! Replies are matched by substring against the rendered command line.
//! A rule with several replies hands them out in order and keeps repeating
//! the last one.
//!
//! # Example
//!
//! ```rust,ignore
//! use ddcci::process::mock::MockRunner;
//!
//! let runner = MockRunner::new()
//!     .on("--version", "ddcutil 2.1.4")
//!     .on("--bus 4 getvcp --brief 0x10", "VCP 10 C 50 100");
//!
//! // ... exercise the code under test ...
//!
//! assert_eq!(runner.call_count("getvcp"), 1);
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::trace;

use super::{CommandLine, CommandOutput, CommandRunner};
use crate::error::{BackendError, Result};

/// Exit code reported for commands without a matching rule.
pub const UNSCRIPTED_EXIT_CODE: i32 = 127;

/// One scripted reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Command succeeds with this stdout.
    Stdout(String),
    /// Command exits with a non-zero status.
    Exit { code: i32, stderr: String },
}

impl Reply {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self::Stdout(text.into())
    }

    fn resolve(&self, command: &CommandLine) -> Result<CommandOutput> {
        match self {
            Self::Stdout(text) => Ok(CommandOutput::success(text.clone())),
            Self::Exit { code, stderr } => Err(BackendError::ProcessFailed {
                command: command.to_string(),
                code: *code,
                stderr: stderr.clone(),
            }),
        }
    }
}

#[derive(Debug)]
struct Rule {
    pattern: String,
    replies: VecDeque<Reply>,
}

/// Command runner answering from a script and recording every call.
#[derive(Debug, Default)]
pub struct MockRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<String>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to commands containing `pattern` with `stdout`.
    #[must_use]
    pub fn on(self, pattern: &str, stdout: &str) -> Self {
        self.on_sequence(pattern, vec![Reply::stdout(stdout)])
    }

    /// Reply to commands containing `pattern` with a non-zero exit.
    #[must_use]
    pub fn on_failure(self, pattern: &str, code: i32, stderr: &str) -> Self {
        self.on_sequence(
            pattern,
            vec![Reply::Exit {
                code,
                stderr: stderr.to_string(),
            }],
        )
    }

    /// Reply to commands containing `pattern` with `replies` in order.
    ///
    /// Rules are tried in registration order; the first match wins.
    #[must_use]
    pub fn on_sequence(self, pattern: &str, replies: Vec<Reply>) -> Self {
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Rule {
                pattern: pattern.to_string(),
                replies: replies.into(),
            });
        self
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded calls containing `pattern`.
    pub fn call_count(&self, pattern: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| call.contains(pattern))
            .count()
    }

    fn reply(&self, command: &CommandLine) -> Result<CommandOutput> {
        let rendered = command.to_string();
        trace!(command = %rendered, "Mock command");
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(rendered.clone());

        let mut rules = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(rule) = rules
            .iter_mut()
            .find(|rule| rendered.contains(&rule.pattern))
        else {
            return Err(BackendError::ProcessFailed {
                command: rendered,
                code: UNSCRIPTED_EXIT_CODE,
                stderr: "no scripted reply".to_string(),
            });
        };

        let reply = if rule.replies.len() > 1 {
            rule.replies.pop_front()
        } else {
            rule.replies.front().cloned()
        };
        match reply {
            Some(reply) => reply.resolve(command),
            None => Ok(CommandOutput::default()),
        }
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, command: &CommandLine) -> Result<CommandOutput> {
        self.reply(command)
    }

    fn run_blocking(&self, command: &CommandLine) -> Result<CommandOutput> {
        self.reply(command)
    }
}
