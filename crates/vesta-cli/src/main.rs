//! Vesta CLI - cell transpiler for reactive notebooks.

mod check;
mod colors;
mod options;
mod transpile;

use clap::{Parser, Subcommand};
use vesta_core::CellMode;

use crate::options::OptionArgs;

#[derive(Parser)]
#[command(name = "vesta")]
#[command(about = "Transpile reactive notebook cells to JavaScript")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Transpile one cell and print it as JSON
    Transpile {
        /// Path to the cell source, or `-` for stdin
        file: String,

        /// Cell mode (js, ojs, md, html, tex, sql, dot); inferred from the extension by default
        #[arg(short, long)]
        mode: Option<CellMode>,

        #[command(flatten)]
        options: OptionArgs,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Transpile many cells and report the ones that fail
    Check {
        /// Paths to the cell sources
        #[arg(required = true)]
        files: Vec<String>,

        /// Cell mode for every file; inferred from each extension by default
        #[arg(short, long)]
        mode: Option<CellMode>,

        #[command(flatten)]
        options: OptionArgs,

        /// Check every file instead of stopping at the first failure
        #[arg(long)]
        keep_going: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format vesta-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(vesta_err) = err.downcast_ref::<vesta_core::Error>() {
            anyhow::anyhow!("{}", vesta_err.with_hint())
        } else {
            err
        }
    };

    match cli.command {
        Commands::Transpile {
            file,
            mode,
            options,
            pretty,
        } => {
            let options = options.load()?;
            transpile::execute(&file, mode, &options, pretty).map_err(format_error)?;
        }

        Commands::Check {
            files,
            mode,
            options,
            keep_going,
        } => {
            let options = options.load()?;
            check::execute(&files, mode, &options, keep_going).map_err(format_error)?;
        }
    }

    Ok(())
}
