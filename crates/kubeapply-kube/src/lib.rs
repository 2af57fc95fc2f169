//! kubeapply Kube - kubectl orchestration for kubeapply
//!
//! This crate provides:
//! - **Ordered apply**: manifests are sorted by kind priority and materialized
//!   so `kubectl apply -R` processes them in a safe order
//! - **Structured diffs**: the `kadiff` external differ protocol, with
//!   size-bounded, per-resource results
//! - **Apply classification**: dry-run and real snapshots compared into
//!   created/updated results
//! - **Targeted deletes**: resource identifiers resolved to API resource names
//!   through pluggable discovery
//! - **Command runners**: a real kubectl runner and a scripted fake for tests

pub mod apply;
pub mod client;
pub mod config;
pub mod delete;
pub mod diff;
pub mod discovery;
pub mod error;
pub mod format;
pub mod mock;
pub mod runner;

pub use apply::{ApplyOptions, ApplyResult, classify, decode_snapshot};
pub use client::{OrderedClient, WorkDir};
pub use config::{ClientConfig, DiscoveryMode};
pub use diff::{
    CONTEXT_LINES_ENV, DiffConfig, DiffEngine, DiffResult, DiffResults, EXTERNAL_DIFF_ENV,
    MAX_LINE_LENGTH_ENV, MAX_SIZE_ENV, Operation, clip_diff, clip_line, parse_structured_output,
    sanitize_diff,
};
pub use discovery::{
    ApiResourceDiscovery, ApiResourceInfo, LiveDiscovery, StaticDiscovery, TableDiscovery,
    parse_resources_table,
};
pub use error::{KubeError, Result};
pub use format::{prettify_output, text_table};
pub use mock::FakeRunner;
pub use runner::{CommandOutput, CommandRunner, Invocation, KubectlRunner};
