//! safemark CLI - Markdown to sanitized HTML.
//!
//! Provides commands for:
//! - `render`: Convert a Markdown file (or stdin) to HTML
//! - `check-href`: Check a URL against the link safety policy

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckHrefArgs, RenderArgs};
use output::Output;

/// safemark - Markdown to sanitized HTML.
#[derive(Parser)]
#[command(name = "safemark", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render Markdown to sanitized HTML.
    Render(RenderArgs),
    /// Check whether a link destination is allowed.
    CheckHref(CheckHrefArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Render(args) if args.verbose);

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(),
        Commands::CheckHref(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
