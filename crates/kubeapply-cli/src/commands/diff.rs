//! Diff command - compare manifests against the live cluster

use std::path::PathBuf;

use kubeapply_kube::{OrderedClient, sanitize_diff};

use crate::display;
use crate::error::Result;

/// Run the diff command
pub async fn run(
    client: &OrderedClient,
    paths: &[PathBuf],
    structured: bool,
    summary: bool,
    sanitize: bool,
) -> Result<()> {
    if structured {
        let results = client.diff_structured(paths).await?;
        display::print_diff_results(&results, summary, sanitize);
        return Ok(());
    }

    let output = client.diff(paths).await?;
    let output = if sanitize {
        sanitize_diff(&output)
    } else {
        output
    };
    display::print_diff_text(&output);
    Ok(())
}
