//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ord-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the gateway: load config, warm up content, serve requests.
    Start {
        #[arg(long, default_value = "./ord-gateway.json")]
        config: PathBuf,
    },

    /// Load and validate configuration, print the effective (secret-redacted)
    /// config as JSON, then exit.
    ConfigCheck {
        #[arg(long, default_value = "./ord-gateway.json")]
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
