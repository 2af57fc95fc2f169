//! Apply command - apply manifests in kind priority order

use std::path::PathBuf;

use console::style;
use kubeapply_kube::{ApplyOptions, OrderedClient};

use crate::display;
use crate::error::Result;

/// Run the apply command
pub async fn run(
    client: &OrderedClient,
    paths: &[PathBuf],
    structured: bool,
    dry_run: bool,
    output: Option<String>,
) -> Result<()> {
    if structured {
        let results = client.apply_structured(paths).await?;
        display::print_apply_results(&results);
        return Ok(());
    }

    let options = ApplyOptions {
        output_format: output,
        dry_run,
    };
    let output = client.apply(paths, &options).await?;
    print!("{}", output);

    if dry_run {
        eprintln!("{} Dry run - nothing was changed", style("✓").green().bold());
    }
    Ok(())
}
