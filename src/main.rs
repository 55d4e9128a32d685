//! jsoncache - inspect a JSON file cache from the command line
//!
//! Prints cache locations, lists entries, reports freshness and dumps cached
//! payloads. Set `RUST_LOG=jsoncache=debug` to trace cache lookups.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jsoncache::cli::{run, Cli, Outcome};

/// Sends log output to stderr so it never mixes with command output
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    setup_logging();

    let cli = Cli::parse();
    let outcome = run(&cli, &mut io::stdout().lock(), &mut io::stderr().lock())?;

    Ok(match outcome {
        Outcome::Success => ExitCode::SUCCESS,
        Outcome::Miss => ExitCode::from(1),
    })
}
