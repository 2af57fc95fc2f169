//! Writing ordered manifests to disk
//!
//! `kubectl apply -R -f <dir>` processes files in lexicographic order, which
//! is the only ordering control available at that boundary. Each manifest is
//! therefore written to its own file whose name starts with a zero-padded
//! sequence number.

use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::manifest::Manifest;

/// Largest manifest count whose six-digit prefixes still sort correctly
pub const MAX_MATERIALIZED: usize = 999_999;

/// File name for the manifest at `index` in apply order
pub fn materialized_file_name(index: usize, manifest: &Manifest) -> String {
    format!(
        "{:06}_{}_{}_{}.yaml",
        index,
        sanitize_token(&manifest.name),
        sanitize_token(&manifest.namespace),
        sanitize_token(&manifest.kind)
    )
}

/// Write manifests into `dir` so that sorted file names reproduce their order
///
/// Contents are written verbatim. Returns the written paths in order.
pub fn materialize(manifests: &[Manifest], dir: &Path) -> Result<Vec<PathBuf>> {
    if manifests.len() > MAX_MATERIALIZED {
        return Err(CoreError::TooManyManifests {
            count: manifests.len(),
            max: MAX_MATERIALIZED,
        });
    }

    let mut paths = Vec::with_capacity(manifests.len());

    for (index, manifest) in manifests.iter().enumerate() {
        let path = dir.join(materialized_file_name(index, manifest));
        std::fs::write(&path, manifest.raw_content.as_bytes()).map_err(|source| {
            CoreError::WriteFile {
                path: path.clone(),
                source,
            }
        })?;
        paths.push(path);
    }

    Ok(paths)
}

/// Keep file names portable; `_` is reserved as the token separator
fn sanitize_token(token: &str) -> String {
    token
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
