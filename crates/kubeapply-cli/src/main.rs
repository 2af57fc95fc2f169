//! kubeapply CLI - ordered kubectl applies, structured diffs and targeted deletes

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod display;
mod error;
mod exit_codes;

use commands::ClusterArgs;
use error::Result;

#[derive(Parser)]
#[command(name = "kubeapply")]
#[command(author = "kubeapply Contributors")]
#[command(version)]
#[command(about = "Ordered kubectl applies, structured diffs and targeted deletes", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    cluster: ClusterArgs,

    /// Enable debug output (also runs kubectl with -v 8)
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print manifests in apply order with their content hashes
    Order {
        /// Manifest files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Apply manifests in kind priority order
    Apply {
        /// Manifest files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Dry-run first and report created/updated resources
        #[arg(long, conflicts_with_all = ["dry_run", "output"])]
        structured: bool,

        /// Only show what would be applied
        #[arg(long)]
        dry_run: bool,

        /// kubectl output format
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Diff manifests against the live cluster
    Diff {
        /// Manifest files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Produce per-resource results through kadiff
        #[arg(long)]
        structured: bool,

        /// Only print the summary table (structured mode)
        #[arg(long, requires = "structured")]
        summary: bool,

        /// Mask creationTimestamp and uid values
        #[arg(long)]
        sanitize: bool,
    },

    /// Delete resources by identifier (<apiVersion>.<kind>.<namespace>.<name>)
    Delete {
        /// Resource identifiers
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show the API resources used to resolve kinds for deletes
    ApiResources,
}

fn init_tracing(debug: bool) {
    let filter = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Order { paths } => commands::order::run(&paths),

        Commands::Apply {
            paths,
            structured,
            dry_run,
            output,
        } => {
            let client = cli.cluster.client(cli.debug)?;
            commands::apply::run(&client, &paths, structured, dry_run, output).await
        }

        Commands::Diff {
            paths,
            structured,
            summary,
            sanitize,
        } => {
            let client = cli.cluster.client(cli.debug)?;
            commands::diff::run(&client, &paths, structured, summary, sanitize).await
        }

        Commands::Delete { ids } => {
            let client = cli.cluster.client(cli.debug)?;
            commands::delete::run(&client, &ids).await
        }

        Commands::ApiResources => {
            let client = cli.cluster.client(cli.debug)?;
            commands::api_resources::run(&client).await
        }
    }
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
