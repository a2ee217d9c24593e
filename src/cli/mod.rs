//! Command-line interface: `start` boots the gateway, `config-check`
//! validates configuration without serving.

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::run_command;
pub use errors::{CliError, CliResult};
