//! Weave command-line interface
//!
//! Entry point for the `weave` binary: argument parsing, logging setup and
//! command dispatch.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use weave_core::error::{WeaveError, WeaveResult};

mod commands;
mod output;

use commands::{dispatch_command, CommandContext};
use output::ErrorFormatter;

#[derive(Parser)]
#[command(name = "weave")]
#[command(about = "Concurrent dependency resolver")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Use this configuration file instead of searching for weave.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Resolve the full dependency set of one or more packages
    Resolve(ResolveArgs),
    /// Validate configuration and manifest sources
    Check,
    /// Show version information
    Version,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ResolveArgs {
    /// Root packages as name@version; defaults to the [roots] table
    #[arg(value_name = "PACKAGE")]
    pub packages: Vec<String>,

    /// Manifest directory, searched before configured sources (repeatable)
    #[arg(short, long = "manifests", value_name = "DIR")]
    pub manifests: Vec<Utf8PathBuf>,

    /// Print the resolution as JSON
    #[arg(long)]
    pub json: bool,

    /// Read every manifest from disk, even if seen before
    #[arg(long)]
    pub no_cache: bool,

    /// Give up when the graph has not settled within this many milliseconds
    #[arg(long, value_name = "MS")]
    pub settle_timeout_ms: Option<u64>,
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    info!("Starting weave v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_cli(cli) {
        eprintln!("{}", ErrorFormatter::new().format_error(&e));
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> WeaveResult<()> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| WeaveError::io("Failed to create async runtime".to_string(), e))?;

    rt.block_on(async {
        let context = CommandContext::new(cli.config).await?;
        dispatch_command(cli.command, &context).await
    })
}

/// Logs go to stderr; `RUST_LOG` overrides the verbosity flag
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("weave={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Panic occurred: {}", panic_info);
        eprintln!("weave encountered an unexpected error and needs to exit.");
        eprintln!("Please report this issue with the output of 'weave --verbose'.");
    }));
}
