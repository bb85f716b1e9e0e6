// ABOUTME: Entry point for the lamina CLI application.
// ABOUTME: Parses arguments, sets up tracing, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use lamina::config::{self, Config};
use lamina::error::Result;
use lamina::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("lamina=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);

    if let Err(e) = run(cli, &mut output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &mut Output) -> Result<()> {
    let cwd = env::current_dir()?;

    let load = || match cli.config {
        Some(ref path) => Config::load(path),
        None => Config::discover(&cwd),
    };

    match cli.command {
        Commands::Init {
            ref product,
            ref function,
            force,
        } => {
            config::init_config(&cwd, product.as_deref(), function.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Products => commands::products(&load()?, output).await,
        Commands::Build { ref product } => {
            commands::build(&load()?, product.as_deref(), output).await
        }
        Commands::Deploy {
            ref product,
            ref archive,
        } => commands::deploy(&load()?, product.as_deref(), archive.as_deref(), output).await,
        Commands::Invoke {
            ref product,
            ref qualifier,
            ref payload,
        } => {
            commands::invoke(
                &load()?,
                product.as_deref(),
                qualifier.as_deref(),
                payload.as_deref(),
                output,
            )
            .await
        }
    }
}
