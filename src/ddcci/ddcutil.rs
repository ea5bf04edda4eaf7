//! Thin wrapper around the `ddcutil` command line tool.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::DdcciSection;
use crate::error::{BackendError, Result};
use crate::process::{CommandLine, CommandOutput, CommandRunner};

/// Printed on stdout by ddcutil when an i2c transfer failed transiently.
pub const FAILURE_MARKER: &str = "DDC communication failed";

/// Driver and kernel module chatter that ddcutil mixes into stdout.
const NOISE: [&str; 6] = [
    "(is_nvidia_einval_bug          ) nvida/i2c-dev bug encountered. Forcing future io I2C_IO_STRATEGY_FILEIO. Retrying\n",
    "Unable to open directory /sys/bus/i2c/devices/i2c--1: No such file or directory\n",
    "Device /dev/i2c-255 does not exist. Error = ENOENT(2): No such file or directory\n",
    "/sys/bus/i2c buses without /dev/i2c-N devices: /sys/bus/i2c/devices/i2c-255\n",
    "Driver i2c_dev must be loaded or builtin\n",
    "See https://www.ddcutil.com/kernel_module\n",
];

static NONTABLE_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"busno=\d+, Feature 0x[0-9A-Fa-f]+ should not exist but ddc_get_nontable_vcp_value\(\) succeeds, returning mh=0x[0-9A-Fa-f]+ ml=0x[0-9A-Fa-f]+ sh=0x[0-9A-Fa-f]+ sl=0x[0-9A-Fa-f]+\n?",
    )
    .expect("valid nontable noise regex")
});

/// Remove known noise lines from ddcutil stdout.
pub fn strip_noise(stdout: &str) -> String {
    let mut cleaned = stdout.to_string();
    for noise in NOISE {
        if cleaned.contains(noise) {
            cleaned = cleaned.replace(noise, "");
        }
    }
    NONTABLE_NOISE.replace_all(&cleaned, "").into_owned()
}

/// Builds ddcutil command lines from the adapter configuration and runs
/// them with bounded retries.
#[derive(Debug, Clone)]
pub struct DdcutilWrapper<R> {
    runner: R,
    executable: Vec<String>,
    sleep_multiplier: f64,
    no_verify: bool,
    brute_force_attempts: u32,
}

impl<R: CommandRunner> DdcutilWrapper<R> {
    pub fn new(config: &DdcciSection, runner: R) -> Self {
        let mut executable: Vec<String> = config
            .ddcutil_executable
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if executable.is_empty() {
            executable.push("ddcutil".to_string());
        }
        Self {
            runner,
            executable,
            sleep_multiplier: config.ddcutil_sleep_multiplier,
            no_verify: config.ddcutil_no_verify,
            brute_force_attempts: config.brute_force_attempts,
        }
    }

    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Assemble `<exe> [--bus N] [--sleep-multiplier M] <verb> [--noverify] <args>`.
    pub fn build_command(
        &self,
        verb: &str,
        args: &[&str],
        bus: Option<u32>,
    ) -> Result<CommandLine> {
        let (program, leading) = self
            .executable
            .split_first()
            .ok_or_else(|| BackendError::Argument("ddcutil executable is empty".to_string()))?;
        let mut command = CommandLine::new(program.clone()).args(leading.iter().cloned());

        match (verb, bus) {
            ("detect", Some(bus)) => {
                warn!(bus, "Ignoring bus number for ddcutil detect");
            }
            ("detect", None) => {}
            (_, Some(bus)) => command = command.arg("--bus").arg(bus.to_string()),
            (_, None) => {
                return Err(BackendError::Argument(format!(
                    "ddcutil {verb} requires a bus number"
                )));
            }
        }

        #[allow(clippy::float_cmp)]
        let custom_sleep = self.sleep_multiplier != 0.0 && self.sleep_multiplier != 1.0;
        if custom_sleep {
            command = command
                .arg("--sleep-multiplier")
                .arg(self.sleep_multiplier.to_string());
        }

        command = command.arg(verb);

        if self.no_verify {
            if verb == "setvcp" {
                command = command.arg("--noverify");
            } else {
                warn!(verb, "--noverify only applies to setvcp, ignoring it");
            }
        }

        Ok(command.args(args.iter().copied()))
    }

    /// Run a ddcutil verb, retrying while stdout reports a communication
    /// failure, and return the output with noise removed.
    ///
    /// When every attempt fails, the last output is returned as is.
    pub async fn run(&self, verb: &str, args: &[&str], bus: Option<u32>) -> Result<CommandOutput> {
        let command = self.build_command(verb, args, bus)?;
        let mut attempt = 0;
        let mut output = self.invoke(&command).await?;

        while output.stdout.contains(FAILURE_MARKER) {
            if attempt >= self.brute_force_attempts {
                if attempt > 0 {
                    warn!(%command, "Command failed {} times in a row", attempt + 1);
                }
                break;
            }
            attempt += 1;
            debug!(%command, attempt, "Retrying after communication failure");
            output = self.invoke(&command).await?;
        }

        if attempt > 0 && !output.stdout.contains(FAILURE_MARKER) {
            info!(%command, "Required {} attempts", attempt + 1);
        }

        output.stdout = strip_noise(&output.stdout);
        Ok(output)
    }

    async fn invoke(&self, command: &CommandLine) -> Result<CommandOutput> {
        self.runner
            .run(command)
            .await
            .map_err(|e| wrap_error(command, e))
    }

    /// Installed ddcutil version, e.g. `2.1.4`.
    pub fn version(&self) -> Result<String> {
        let (program, leading) = self
            .executable
            .split_first()
            .ok_or_else(|| BackendError::Argument("ddcutil executable is empty".to_string()))?;
        let command = CommandLine::new(program.clone())
            .args(leading.iter().cloned())
            .arg("--version");
        let output = self
            .runner
            .run_blocking(&command)
            .map_err(|e| wrap_error(&command, e))?;
        let first_line = output.stdout.lines().next().unwrap_or_default();
        Ok(first_line.replace("ddcutil", "").trim().to_string())
    }
}

fn wrap_error(command: &CommandLine, error: BackendError) -> BackendError {
    match error {
        BackendError::Ddcutil { .. } => error,
        other => BackendError::Ddcutil {
            command: command.to_string(),
            reason: other.to_string(),
        },
    }
}
