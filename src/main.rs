//! DDC/CI plasmoid backend - detect and control monitors through ddcutil.
//!
//! Prints exactly one JSON object per invocation on stdout.
#![forbid(unsafe_code)]

use clap::Parser;
use tracing::{debug, error, info};

use ddcci::adapters::Orchestrator;
use ddcci::cache::CacheStore;
use ddcci::cli::{Cli, Commands, ConfigArgs};
use ddcci::config::{self, Config};
use ddcci::error::{BackendError, Result};
use ddcci::lock::ProcessLock;
use ddcci::logging;
use ddcci::output::{JsonOutput, SetResponse};
use ddcci::process::SystemRunner;

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.debug, cli.debug_log.as_deref(), cli.log_json);
    info!(version = ddcci::VERSION, command = cli.command.name(), "Starting backend");

    let output = JsonOutput::new(cli.pretty);
    let command = cli.command.name();

    if let Err(e) = run(&cli, &output) {
        error!(error = %e, kind = e.kind(), "Command failed");
        output.error(command, &e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, output: &JsonOutput) -> Result<()> {
    let _lock = if cli.command.needs_lock() {
        Some(ProcessLock::acquire(&config::lock_file())?)
    } else {
        None
    };

    match &cli.command {
        Commands::Version => {
            output.response("version", ddcci::VERSION);
            Ok(())
        }
        Commands::Config(args) => cmd_config(args, output),
        command => {
            let config = Config::load_default()?;
            let mut cache = CacheStore::load_default()?;
            debug!(path = %cache.path().display(), loaded = cache.is_loaded(), "Detect cache");
            let mut orchestrator = Orchestrator::new(&config, SystemRunner::new(), &mut cache);

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_monitor_command(&mut orchestrator, command, output))
        }
    }
}

async fn run_monitor_command(
    orchestrator: &mut Orchestrator<'_, SystemRunner>,
    command: &Commands,
    output: &JsonOutput,
) -> Result<()> {
    let name = command.name();

    match command {
        Commands::Detect(args) => {
            let summary = orchestrator.detect(&args.adapters).await?;
            output.response(name, &summary);
        }
        Commands::Set(args) => {
            let value = orchestrator
                .set(args.adapter, args.id, args.property, args.value, false)
                .await?;
            output.response(
                name,
                &SetResponse {
                    adapter: args.adapter,
                    id: args.id,
                    property: args.property,
                    value,
                },
            );
        }
        Commands::Increment(args) => {
            let value = orchestrator
                .set(args.adapter, args.id, args.property, args.delta, true)
                .await?;
            output.response(
                name,
                &SetResponse {
                    adapter: args.adapter,
                    id: args.id,
                    property: args.property,
                    value,
                },
            );
        }
        Commands::SetAll(args) => {
            let report = orchestrator.set_all(args.property, args.value, false).await?;
            output.response(name, &report);
        }
        Commands::IncrementAll(args) => {
            let report = orchestrator.set_all(args.property, args.delta, true).await?;
            output.response(name, &report);
        }
        Commands::Version | Commands::Config(_) => {
            return Err(BackendError::Argument(format!(
                "`{name}` does not talk to monitors"
            )));
        }
    }
    Ok(())
}

fn cmd_config(args: &ConfigArgs, output: &JsonOutput) -> Result<()> {
    let path = config::config_file()?;
    let mut config = Config::load(&path)?;

    let value = match &args.value {
        Some(value) => {
            let normalized = config.set(&args.key, value)?;
            config.save(&path)?;
            info!(key = %args.key, value = %normalized, "Config value updated");
            normalized
        }
        None => config.get(&args.key)?,
    };
    output.response("config", &value);
    Ok(())
}
