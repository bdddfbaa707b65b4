use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::commands::{ExtractCommand, InspectCommand};

/**
    Recover the device SSL certificate and private key from a CAL0 blob.

    `cal0-ssl <CAL0_PATH> <KEYS_PATH> [--ssl-path <PATH>]` extracts;
    `cal0-ssl inspect <CAL0_PATH>` only reads the container.
*/
#[derive(Parser)]
#[command(
    name = "cal0-ssl",
    version,
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
pub struct Cli {
    /// Enable debug logging. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    extract: Option<ExtractCommand>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show the CAL0 fields without decrypting anything.
    Inspect(InspectCommand),
}

impl Cli {
    pub fn init_logging(&self) {
        let level = if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        };
        env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .init();
    }

    pub fn run(self) -> Result<()> {
        match (self.command, self.extract) {
            (Some(Command::Inspect(cmd)), _) => cmd.run(),
            (None, Some(cmd)) => cmd.run(),
            (None, None) => anyhow::bail!("missing CAL0 and keys file paths"),
        }
    }
}
