//! kadiff - structured external differ for `kubectl diff`
//!
//! kubectl runs this program (named by `KUBECTL_EXTERNAL_DIFF`) with two
//! directories holding the live and merged state of every resource. One JSON
//! envelope with the per-resource results is printed to stdout; logs go to
//! stderr so stdout stays machine-readable.

use clap::Parser;
use kubeapply_kube::{
    CONTEXT_LINES_ENV, DiffConfig, DiffEngine, DiffResults, MAX_LINE_LENGTH_ENV, MAX_SIZE_ENV,
};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kadiff")]
#[command(version)]
#[command(about = "Generate a structured diff between manifests in two directories", long_about = None)]
struct Cli {
    /// Old (live) side
    old: PathBuf,

    /// New (merged) side
    new: PathBuf,

    /// Log at debug level
    #[arg(long)]
    debug: bool,

    /// Number of context lines to show in diff outputs
    #[arg(long, env = CONTEXT_LINES_ENV, default_value_t = 3)]
    context_lines: usize,

    /// Max length of lines from diff
    #[arg(long, env = MAX_LINE_LENGTH_ENV, default_value_t = 256)]
    max_line_length: usize,

    /// Total maximum size of diff after clipping long lines
    #[arg(long, env = MAX_SIZE_ENV, default_value_t = 3000)]
    max_size: usize,
}

fn main() -> Result<()> {
    miette::set_panic_hook();

    let cli = Cli::parse();

    let filter = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let engine = DiffEngine::new(DiffConfig {
        context_lines: cli.context_lines,
        max_line_length: cli.max_line_length,
        max_size: cli.max_size,
    });

    let results = engine.diff_paths(&cli.old, &cli.new).into_diagnostic()?;
    tracing::debug!("{} resource(s) differ", results.len());

    let envelope = DiffResults { results };
    let json = serde_json::to_string_pretty(&envelope).into_diagnostic()?;
    println!("{}", json);

    Ok(())
}
