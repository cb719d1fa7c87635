//! drop CLI - static content pipeline.
//!
//! Provides commands for:
//! - `build`: Process every configured site into a static output directory
//! - `serve`: Serve the configured sites, processing pages on request

mod commands;
mod error;
mod output;

use std::error::Error as _;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, ServeArgs};
use error::CliError;
use output::Output;

/// drop - static content pipeline.
#[derive(Parser)]
#[command(name = "drop", version, about)]
struct Cli {
    /// Path to configuration file (default: auto-discover drop.toml).
    #[arg(short, long, global = true, env = "DROP_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output (info-level logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build every configured site.
    Build(BuildArgs),
    /// Start the development server.
    Serve(ServeArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let debug = matches!(&cli.command, Command::Build(args) if args.debug);

    if let Err(err) = run(cli.command, cli.config) {
        if debug {
            output.error(&format!("Error: {err:?}"));
            let mut source = err.source();
            while let Some(cause) = source {
                output.error(&format!("Caused by: {cause}"));
                source = cause.source();
            }
        } else {
            output.error(&format!("Error: {err}"));
        }
        std::process::exit(1);
    }
}

/// Run one command to completion on a single-threaded runtime.
fn run(command: Command, config: Option<PathBuf>) -> Result<(), CliError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match command {
        Command::Build(args) => rt.block_on(args.execute(config.as_deref())),
        Command::Serve(args) => rt.block_on(args.execute(config.as_deref())),
    }
}
