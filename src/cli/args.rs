//! Command-line argument parsing for the Sovereign console
//!
//! Global flags are parsed with clap; the command and subcommand stay plain
//! tokens so the dispatcher can apply its own fallback rules.

use clap::Parser;
use std::path::PathBuf;

/// Sovereign - status, CCCE metrics and agent chat for the local agent stack
#[derive(Parser, Debug)]
#[command(name = "sovereign")]
#[command(version)]
#[command(about = "Command console for the sovereign agent stack", long_about = None)]
pub struct Args {
    /// Command (status, ccce, qslice, agent, chat, train, server, mesh, writer, unified, help)
    #[arg(value_name = "COMMAND")]
    pub command: Option<String>,

    /// Subcommand; unknown values fall back to the command's default
    #[arg(value_name = "SUBCOMMAND")]
    pub subcommand: Option<String>,

    /// Extra arguments forwarded to collaborator programs
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<String>,

    /// Agent service host (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Agent service port (overrides config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seed for the simulated metrics source
    #[arg(long)]
    pub seed: Option<u64>,

    /// Verbosity level: -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only on stderr)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}
