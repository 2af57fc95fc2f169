//! Kubeapply Core - manifest handling for ordered kubectl applies
//!
//! This crate provides the pure, cluster-independent building blocks:
//! - `Documents`: Lenient multi-document splitting of YAML files
//! - `Manifest`: A single resource document with its identity metadata
//! - `ResourceId`: Canonical `<apiVersion>.<kind>.<namespace>.<name>` identifiers
//! - `KindPriority`: Deterministic apply ordering by kind, namespace and name
//! - `materialize`: Writing an ordered set to disk so file order is apply order

pub mod document;
pub mod error;
pub mod identity;
pub mod manifest;
pub mod materialize;
pub mod order;

pub use document::{Documents, is_blank_document};
pub use error::{CoreError, Result};
pub use identity::ResourceId;
pub use manifest::{
    KINDS_WITHOUT_METADATA, Manifest, ManifestHeader, digest_manifests, load_manifests,
    parse_manifests, resource_hashes,
};
pub use materialize::{MAX_MATERIALIZED, materialize, materialized_file_name};
pub use order::{DEFAULT_KIND_ORDER, KindPriority};
