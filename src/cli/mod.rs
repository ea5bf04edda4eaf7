//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::monitor::{AdapterKind, Property};

/// Backend of the DDC/CI monitor plasmoid.
///
/// Every command prints one JSON object to stdout. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "ddcci-plasmoid-backend", version, about, long_about = None)]
#[command(propagate_version = true)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Log debug messages to stderr
    #[arg(long, short = 'd', global = true)]
    pub debug: bool,

    /// Also append log messages to this file
    #[arg(long, global = true, value_name = "LOG_FILE")]
    pub debug_log: Option<PathBuf>,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Pretty-print the JSON result
    #[arg(long, global = true, env = "DDCCI_BACKEND_PRETTY")]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the backend version
    Version,

    /// Detect monitors and refresh the cache
    Detect(DetectArgs),

    /// Set a property of one monitor
    Set(SetArgs),

    /// Set a property of every cached monitor
    SetAll(SetAllArgs),

    /// Change a property of one monitor by a relative amount
    Increment(IncrementArgs),

    /// Change a property of every cached monitor by a relative amount
    IncrementAll(IncrementAllArgs),

    /// Read or write a configuration value
    Config(ConfigArgs),
}

impl Commands {
    /// Command name used in JSON output.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::Detect(_) => "detect",
            Self::Set(_) => "set",
            Self::SetAll(_) => "set-all",
            Self::Increment(_) => "increment",
            Self::IncrementAll(_) => "increment-all",
            Self::Config(_) => "config",
        }
    }

    /// Commands that talk to monitors or write the detect cache.
    pub const fn needs_lock(&self) -> bool {
        !matches!(self, Self::Version | Self::Config(_))
    }
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Adapters to query
    #[arg(required = true, value_enum)]
    pub adapters: Vec<AdapterKind>,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Adapter of the monitor
    #[arg(value_enum)]
    pub adapter: AdapterKind,

    /// Monitor id as reported by detect
    pub id: u32,

    /// Property to change
    #[arg(value_enum)]
    pub property: Property,

    /// New value
    #[arg(allow_negative_numbers = true)]
    pub value: i64,
}

#[derive(Args, Debug)]
pub struct SetAllArgs {
    /// Property to change
    #[arg(value_enum)]
    pub property: Property,

    /// New value
    #[arg(allow_negative_numbers = true)]
    pub value: i64,
}

#[derive(Args, Debug)]
pub struct IncrementArgs {
    /// Adapter of the monitor
    #[arg(value_enum)]
    pub adapter: AdapterKind,

    /// Monitor id as reported by detect
    pub id: u32,

    /// Property to change
    #[arg(value_enum)]
    pub property: Property,

    /// Amount to add, may be negative
    #[arg(allow_negative_numbers = true)]
    pub delta: i64,
}

#[derive(Args, Debug)]
pub struct IncrementAllArgs {
    /// Property to change
    #[arg(value_enum)]
    pub property: Property,

    /// Amount to add, may be negative
    #[arg(allow_negative_numbers = true)]
    pub delta: i64,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config identifier of the form section.key
    pub key: String,

    /// New value; prints the current value when omitted
    #[arg(allow_negative_numbers = true)]
    pub value: Option<String>,
}
