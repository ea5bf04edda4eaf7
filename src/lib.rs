//! DDC/CI plasmoid backend library.
//!
//! Detects monitors through `ddcutil`, validates requested property values
//! against the last detection result and applies them.
//!
//! # Modules
//!
//! - `tree`: Parser for indented tool output
//! - `monitor`: Monitor, property and detection summary model
//! - `process`: External command execution and its test double
//! - `ddcci`: The ddcutil based adapter
//! - `validation`: Clamping and choice checks for requested values
//! - `adapters`: Adapter dispatch and the detect/set workflows
//! - `cache`: Persistent detection result
//! - `config`: Configuration file handling
//! - `lock`: Process-wide lock
//! - `error`: Error types with user-recoverable hints
//! - `output`: JSON result objects
#![forbid(unsafe_code)]

pub mod adapters;
pub mod cache;
pub mod cli;
pub mod config;
pub mod ddcci;
pub mod error;
pub mod lock;
pub mod logging;
pub mod monitor;
pub mod output;
pub mod process;
pub mod tree;
pub mod validation;

/// Crate version reported by the `version` command.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
