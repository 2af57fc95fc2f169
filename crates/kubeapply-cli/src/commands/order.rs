//! Order command - show the apply order without touching a cluster

use std::path::PathBuf;

use console::style;
use kubeapply_core::{KindPriority, digest_manifests, load_manifests};

use crate::display;
use crate::error::Result;

/// Run the order command
pub fn run(paths: &[PathBuf]) -> Result<()> {
    let mut manifests = load_manifests(paths)?;
    KindPriority::default().sort(&mut manifests);

    display::print_ordered(&manifests);
    eprintln!(
        "{} {} manifest(s), digest {}",
        style("✓").green().bold(),
        manifests.len(),
        digest_manifests(&manifests)
    );
    Ok(())
}
