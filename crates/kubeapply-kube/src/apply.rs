//! Ordered apply and result classification
//!
//! Manifests are loaded, sorted by [`KindPriority`](kubeapply_core::KindPriority)
//! and written to a fresh temporary directory with order-preserving file
//! names before `kubectl apply -R -f <dir>` runs over it.
//!
//! In structured mode the same set is applied twice with `-o json`: first as
//! a dry run, whose output stands in for the "before" state, then for real.
//! [`classify`] compares the two snapshots per resource.

use std::collections::HashMap;
use std::path::Path;

use kube::api::DynamicObject;
use kubeapply_core::{Manifest, ResourceId, load_manifests, materialize};
use tracing::info;

use crate::client::{OrderedClient, WorkDir};
use crate::error::Result;
use crate::format::text_table;
use crate::runner::Invocation;

/// Options for a single `kubectl apply`
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Passed as `-o <format>`
    pub output_format: Option<String>,
    pub dry_run: bool,
}

impl ApplyOptions {
    pub fn dry_run() -> Self {
        Self {
            output_format: None,
            dry_run: true,
        }
    }

    pub fn with_output(mut self, format: impl Into<String>) -> Self {
        self.output_format = Some(format.into());
        self
    }
}

/// Outcome of applying one resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyResult {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
    /// `resourceVersion` before the apply; empty when created
    pub old_version: String,
    /// `resourceVersion` after the apply
    pub new_version: String,
    pub created: bool,
    /// Creation timestamp of the live object (RFC 3339)
    pub created_at: Option<String>,
}

impl ApplyResult {
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Existing resource whose version moved
    pub fn is_updated(&self) -> bool {
        !self.created && self.old_version != self.new_version
    }

    pub fn created_timestamp(&self) -> &str {
        self.created_at.as_deref().unwrap_or("")
    }
}

/// Compare dry-run ("old") and applied ("new") snapshots
///
/// Every object in `new` yields one result. An object missing from `old`, or
/// present there without a `resourceVersion` (a dry run of a resource that
/// does not exist yet), is reported as created. Objects only in `old` are not
/// reported. Results are sorted by namespace, kind, name and apiVersion.
pub fn classify(old: &[DynamicObject], new: &[DynamicObject]) -> Vec<ApplyResult> {
    let old_versions: HashMap<ResourceId, String> = old
        .iter()
        .map(|obj| (object_id(obj), resource_version(obj)))
        .collect();

    let mut results: Vec<ApplyResult> = new
        .iter()
        .map(|obj| {
            let id = object_id(obj);
            let new_version = resource_version(obj);
            let created_at = obj
                .metadata
                .creation_timestamp
                .as_ref()
                .map(|t| t.0.to_rfc3339());

            let (created, old_version) = match old_versions.get(&id) {
                Some(version) if !version.is_empty() => (false, version.clone()),
                _ => (true, String::new()),
            };

            ApplyResult {
                api_version: id.api_version,
                kind: id.kind,
                namespace: id.namespace,
                name: id.name,
                old_version,
                new_version,
                created,
                created_at,
            }
        })
        .collect();

    results.sort_by(|a, b| {
        a.namespace
            .cmp(&b.namespace)
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.api_version.cmp(&b.api_version))
    });
    results
}

fn object_id(obj: &DynamicObject) -> ResourceId {
    let (api_version, kind) = obj
        .types
        .as_ref()
        .map(|t| (t.api_version.as_str(), t.kind.as_str()))
        .unwrap_or(("", ""));
    ResourceId::new(
        api_version,
        kind,
        obj.metadata.namespace.as_deref().unwrap_or(""),
        obj.metadata.name.as_deref().unwrap_or(""),
    )
}

fn resource_version(obj: &DynamicObject) -> String {
    obj.metadata.resource_version.clone().unwrap_or_default()
}

/// Decode `kubectl apply -o json` output into objects
///
/// kubectl prints a bare object for a single resource and a `List` with
/// `items` otherwise. Leading non-JSON text (warnings on stderr) is skipped;
/// output without any JSON yields no objects.
pub fn decode_snapshot(output: &[u8]) -> Result<Vec<DynamicObject>> {
    let Some(start) = output.iter().position(|b| *b == b'{') else {
        return Ok(Vec::new());
    };

    let value: serde_json::Value = serde_json::Deserializer::from_slice(&output[start..])
        .into_iter::<serde_json::Value>()
        .next()
        .transpose()?
        .unwrap_or(serde_json::Value::Null);

    let is_list = value.get("kind").and_then(|k| k.as_str()) == Some("List");
    let objects = match value {
        serde_json::Value::Object(mut map) if is_list => match map.remove("items") {
            Some(serde_json::Value::Array(items)) => items,
            _ => Vec::new(),
        },
        serde_json::Value::Null => Vec::new(),
        single => vec![single],
    };

    objects
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(Into::into))
        .collect()
}

/// Text table summarizing an apply
pub fn results_table(results: &[ApplyResult]) -> String {
    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|r| {
            let op = if r.is_created() {
                "+"
            } else if r.is_updated() {
                "~"
            } else {
                ""
            };
            vec![
                op.to_string(),
                r.namespace.clone(),
                r.kind.clone(),
                r.name.clone(),
                r.created_timestamp().to_string(),
                r.old_version.clone(),
                r.new_version.clone(),
            ]
        })
        .collect();

    text_table(
        &[
            "Op",
            "Namespace",
            "Kind",
            "Name",
            "Created",
            "Old Version",
            "New Version",
        ],
        &rows,
    )
}

impl OrderedClient {
    /// Apply every manifest under `paths` in priority order
    ///
    /// Returns kubectl's combined output. A failing apply is an error that
    /// carries the output.
    pub async fn apply<P: AsRef<Path>>(&self, paths: &[P], options: &ApplyOptions) -> Result<String> {
        let manifests = load_manifests(paths)?;
        let output = self.apply_manifests(manifests, options).await?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    /// Dry-run then apply with JSON output, and classify each resource
    pub async fn apply_structured<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<ApplyResult>> {
        let manifests = load_manifests(paths)?;

        let dry_run = self
            .apply_manifests(manifests.clone(), &ApplyOptions::dry_run().with_output("json"))
            .await?;
        let old = decode_snapshot(&dry_run)?;

        let applied = self
            .apply_manifests(manifests, &ApplyOptions::default().with_output("json"))
            .await?;
        let new = decode_snapshot(&applied)?;

        let results = classify(&old, &new);
        info!(
            "Applied {} resource(s), {} created",
            results.len(),
            results.iter().filter(|r| r.created).count()
        );
        Ok(results)
    }

    /// Order, materialize and apply an already loaded manifest set
    pub async fn apply_manifests(
        &self,
        mut manifests: Vec<Manifest>,
        options: &ApplyOptions,
    ) -> Result<Vec<u8>> {
        self.priority.sort(&mut manifests);

        let workdir = WorkDir::new("kubeapply_manifests_", self.config.keep_configs)?;
        materialize(&manifests, workdir.path())?;

        let invocation = Invocation::new(["apply", "--kubeconfig"])
            .arg(self.kubeconfig_arg())
            .arg("-R")
            .arg("-f")
            .arg(workdir.path().display().to_string());
        let mut invocation = self.finish_invocation(invocation)?;
        if let Some(format) = &options.output_format {
            invocation = invocation.arg("-o").arg(format);
        }
        if options.dry_run {
            invocation = invocation.arg("--dry-run");
        }

        let output = self.runner.run(&invocation).await?;
        output.into_result(invocation.command_line(&self.runner.program()))
    }
}
