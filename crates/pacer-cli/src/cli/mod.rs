//! CLI for the pacer job scheduler.

mod commands;
mod launcher;
mod plan;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use pacer_core::config::{self, PacerConfig};

use commands::{run_completions, run_decode, run_manpage, run_plan, run_policy};

/// Top-level CLI for the pacer job scheduler.
#[derive(Debug, Parser)]
#[command(name = "pacer")]
#[command(about = "pacer: admission control and launch pacing for batches of report jobs", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/pacer/config.toml.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run every job in a plan file as one unit of work.
    Run {
        /// TOML plan file with [[jobs]] entries.
        #[arg(long, value_name = "FILE")]
        plan: PathBuf,
        /// Unit name for logs and the report (default: plan file name).
        #[arg(long)]
        unit: Option<String>,
        /// Wait for the secondary tiered batch before printing the report.
        #[arg(long)]
        await_secondary: bool,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Decode job output lines (from a file or stdin) and print the events as JSON.
    Decode {
        /// Log file to read; stdin when omitted.
        path: Option<PathBuf>,
        /// Feed events into a tracker and print its final state.
        #[arg(long)]
        track: bool,
    },

    /// Show the resolved concurrency policy of every family.
    Policy {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print the man page (roff) to stdout.
    Manpage,
}

fn load_config(path: Option<&PathBuf>) -> Result<PacerConfig> {
    let cfg = match path {
        Some(path) => config::load_from_path(path)?,
        None => config::load_or_init()?,
    };
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Completions { shell } => run_completions(shell)?,
            CliCommand::Manpage => run_manpage()?,
            CliCommand::Run {
                plan,
                unit,
                await_secondary,
                json,
            } => {
                let cfg = load_config(cli.config.as_ref())?;
                run_plan(&cfg, &plan, unit, await_secondary, json).await?;
            }
            CliCommand::Decode { path, track } => {
                let cfg = load_config(cli.config.as_ref())?;
                run_decode(&cfg, path.as_deref(), track)?;
            }
            CliCommand::Policy { json } => {
                let cfg = load_config(cli.config.as_ref())?;
                run_policy(&cfg, json)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
