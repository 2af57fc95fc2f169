//! Manifest discovery and parsing
//!
//! Manifests are read from one or more directory trees. Every `.yaml`/`.yml`
//! file is split into documents and each document gets a lenient header
//! parse: only `apiVersion`, `kind` and a handful of metadata fields are
//! extracted. The document text itself is kept verbatim so that what gets
//! applied is exactly what was written.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::document::{Documents, is_blank_document};
use crate::error::{CoreError, Result};
use crate::identity::ResourceId;

/// Kinds that legitimately come without per-instance metadata
pub const KINDS_WITHOUT_METADATA: &[&str] = &["ConfigMapList", "RoleBindingList", "RoleList"];

/// Minimal header of a Kubernetes manifest
///
/// Unknown fields are ignored; this is not schema validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ManifestHeader {
    #[serde(rename = "apiVersion", default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub metadata: Option<HeaderMetadata>,
}

/// The identity-bearing subset of `metadata`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HeaderMetadata {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

/// A single resource document read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// File the document was read from
    pub source_path: PathBuf,
    pub api_version: String,
    pub kind: String,
    /// Empty for cluster-scoped resources
    pub namespace: String,
    pub name: String,
    pub annotations: BTreeMap<String, String>,
    /// Trimmed document text, written verbatim when materializing
    pub raw_content: String,
    /// Hex SHA-256 of `raw_content`
    pub content_hash: String,
    /// Canonical identifier, see [`ResourceId`]
    pub resource_id: String,
}

impl Manifest {
    /// Parse a single (already trimmed) document
    ///
    /// Fails when the header cannot be parsed, or when metadata is missing
    /// for a kind that requires it.
    pub fn parse(source_path: &Path, document: &str) -> Result<Self> {
        let header: ManifestHeader = serde_yaml::from_str(document)?;

        let metadata = match header.metadata {
            Some(metadata) => metadata,
            None if KINDS_WITHOUT_METADATA.contains(&header.kind.as_str()) => {
                HeaderMetadata::default()
            }
            None => {
                return Err(CoreError::MissingMetadata { kind: header.kind });
            }
        };

        let resource_id = ResourceId::encode_parts(
            &header.api_version,
            &header.kind,
            &metadata.namespace,
            &metadata.name,
        );

        Ok(Self {
            source_path: source_path.to_path_buf(),
            api_version: header.api_version,
            kind: header.kind,
            namespace: metadata.namespace,
            name: metadata.name,
            annotations: metadata.annotations,
            content_hash: hash_content(document),
            raw_content: document.to_string(),
            resource_id,
        })
    }
}

/// Parse every document of a file's contents
///
/// Blank and comment-only documents are skipped silently. Documents that fail
/// the header parse or lack required metadata are skipped with a warning so
/// one bad document never hides the rest of the file.
pub fn parse_manifests(source_path: &Path, contents: &str) -> Vec<Manifest> {
    let mut manifests = Vec::new();

    for (index, document) in Documents::new(contents).enumerate() {
        if is_blank_document(document) {
            continue;
        }

        match Manifest::parse(source_path, document) {
            Ok(manifest) => manifests.push(manifest),
            Err(CoreError::MissingMetadata { kind }) => {
                warn!(
                    "Could not read metadata from {} manifest (document {}) in {}; skipping",
                    kind,
                    index,
                    source_path.display()
                );
            }
            Err(e) => {
                warn!(
                    "Could not parse document {} in {}; skipping: {}",
                    index,
                    source_path.display(),
                    e
                );
            }
        }
    }

    manifests
}

/// Recursively load all manifests under the given paths
///
/// Files are visited in sorted order. Any I/O error aborts the whole load.
pub fn load_manifests<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Manifest>> {
    let mut manifests = Vec::new();

    for root in paths {
        let root = root.as_ref();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|source| CoreError::Walk {
                path: root.to_path_buf(),
                source,
            })?;

            if !entry.file_type().is_file() || !is_manifest_file(entry.path()) {
                continue;
            }

            let path = entry.path();
            let contents = std::fs::read_to_string(path).map_err(|source| CoreError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;

            let parsed = parse_manifests(path, &contents);
            debug!("Loaded {} manifest(s) from {}", parsed.len(), path.display());
            manifests.extend(parsed);
        }
    }

    Ok(manifests)
}

fn is_manifest_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn hash_content(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Combined digest of a manifest sequence, sensitive to order and content
pub fn digest_manifests(manifests: &[Manifest]) -> String {
    let mut hasher = Sha256::new();
    for manifest in manifests {
        hasher.update(manifest.content_hash.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Map of resource identifier to content hash
pub fn resource_hashes(manifests: &[Manifest]) -> BTreeMap<String, String> {
    manifests
        .iter()
        .map(|m| (m.resource_id.clone(), m.content_hash.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MULTI_DOC: &str = r#"
# this is a comment

---
---
apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRole
metadata:
  name: pod-log-reader
rules:
- apiGroups: [""]
  resources:
    - namespaces
    - pods
  verbs: ["get", "list", "watch"]
---
apiVersion: v1
kind: ServiceAccount
metadata:
  name: fluentbit
  namespace: monitoring
  annotations:
    eks.amazonaws.com/role-arn: arn:aws:iam::123456789012:role/fluentbit
---
apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRoleBinding
metadata:
  name: pod-log-crb
roleRef:
  apiGroup: rbac.authorization.k8s.io
  kind: ClusterRole
  name: pod-log-reader
subjects:
- kind: ServiceAccount
  name: fluent-bit
  namespace: monitoring"#;

    const CONFIG_MAP: &str = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: fluent-bit-config
  namespace: monitoring
data:
  fluent-bit.conf: |
    [SERVICE]
        Flush           5
        Log_Level       info
"#;

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_parse_manifests_multi_document() {
        let manifests = parse_manifests(Path::new("multi.yaml"), MULTI_DOC);
        assert_eq!(manifests.len(), 3);

        let kinds: Vec<_> = manifests.iter().map(|m| m.kind.as_str()).collect();
        assert_eq!(kinds, vec!["ClusterRole", "ServiceAccount", "ClusterRoleBinding"]);

        let sa = &manifests[1];
        assert_eq!(sa.namespace, "monitoring");
        assert_eq!(sa.resource_id, "v1.ServiceAccount.monitoring.fluentbit");
        assert_eq!(
            sa.annotations.get("eks.amazonaws.com/role-arn").map(String::as_str),
            Some("arn:aws:iam::123456789012:role/fluentbit")
        );

        assert_eq!(
            manifests[0].resource_id,
            "rbac.authorization.k8s.io/v1.ClusterRole..pod-log-reader"
        );
    }

    #[test]
    fn test_raw_content_is_verbatim() {
        let manifests = parse_manifests(Path::new("cm.yaml"), CONFIG_MAP);
        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].raw_content, CONFIG_MAP.trim());
        assert_eq!(manifests[0].content_hash.len(), 64);
    }

    #[test]
    fn test_missing_metadata_is_skipped() {
        let input = "apiVersion: v1\nkind: ConfigMap\ndata:\n  a: b\n---\napiVersion: v1\nkind: Secret\nmetadata:\n  name: s\n";
        let manifests = parse_manifests(Path::new("x.yaml"), input);
        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].kind, "Secret");
    }

    #[test]
    fn test_allowlisted_kind_without_metadata() {
        let input = "apiVersion: v1\nkind: RoleList\nitems: []\n";
        let manifests = parse_manifests(Path::new("x.yaml"), input);
        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].resource_id, "v1.RoleList..");
    }

    #[test]
    fn test_malformed_document_does_not_abort_file() {
        let input = "apiVersion: v1\nkind: [unclosed\n---\napiVersion: v1\nkind: Namespace\nmetadata:\n  name: ok\n";
        let manifests = parse_manifests(Path::new("x.yaml"), input);
        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].name, "ok");
    }

    #[test]
    fn test_load_manifests_recursive() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "manifest1.yaml", MULTI_DOC);
        write(tmp.path(), "dir/manifest2.yaml", CONFIG_MAP);
        write(tmp.path(), "dir/notes.txt", "kind: Ignored");
        write(tmp.path(), "other.yml", "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: ns\n");

        let manifests = load_manifests(&[tmp.path()]).unwrap();
        assert_eq!(manifests.len(), 5);
        assert!(manifests.iter().all(|m| m.kind != "Ignored"));
    }

    #[test]
    fn test_load_manifests_missing_root_is_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("does-not-exist");
        let result = load_manifests(&[missing]);
        assert!(matches!(result, Err(CoreError::Walk { .. })));
    }

    #[test]
    fn test_digest_and_hashes() {
        let manifests = parse_manifests(Path::new("multi.yaml"), MULTI_DOC);
        let digest = digest_manifests(&manifests);
        assert_eq!(digest.len(), 64);

        let mut reversed = manifests.clone();
        reversed.reverse();
        assert_ne!(digest, digest_manifests(&reversed));

        let hashes = resource_hashes(&manifests);
        assert_eq!(hashes.len(), 3);
        assert_eq!(
            hashes["v1.ServiceAccount.monitoring.fluentbit"],
            manifests[1].content_hash
        );
    }
}
