//! Sovereign CLI - entry point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use sovereign::cli::{usage, Args, Route};
use sovereign::execution::{Console, EXIT_FAILURE};
use sovereign::{telemetry, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init(args.verbosity());

    let route = match Route::parse(args.command.as_deref(), args.subcommand.as_deref()) {
        Ok(route) => route,
        Err(e) => {
            eprintln!("{} {}\n", "Error:".red().bold(), e);
            eprint!("{}", usage());
            std::process::exit(EXIT_FAILURE);
        }
    };

    // A broken config file must not hide the usage text
    if !route.needs_config() {
        print!("{}", usage());
        return Ok(());
    }

    let mut config = Config::load(args.config.clone()).context("failed to load configuration")?;
    if let Some(host) = &args.host {
        config.agent.host = host.clone();
    }
    if let Some(port) = args.port {
        config.agent.port = port;
    }
    config.validate().context("invalid configuration")?;

    let forward = forwarded_args(route, &args);
    let console = Console::new(config).with_seed(args.seed);
    let code = console.execute(route, &forward).await?;

    std::process::exit(code);
}

/// Arguments handed to an external collaborator
fn forwarded_args(route: Route, args: &Args) -> Vec<String> {
    if !route.forwards_args() {
        return Vec::new();
    }

    match route {
        // `mesh sync` consumed its subcommand token
        Route::Mesh(_) => args.rest.clone(),
        _ => args
            .subcommand
            .iter()
            .chain(args.rest.iter())
            .cloned()
            .collect(),
    }
}
