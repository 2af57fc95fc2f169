//! Structured, size-bounded diffs
//!
//! `kubectl diff` hands the actual comparison to an external program named by
//! `KUBECTL_EXTERNAL_DIFF`, passing two directories (live and merged state)
//! with one file per resource. In structured mode that program is `kadiff`,
//! which runs a [`DiffEngine`] over both sides and prints one
//! [`DiffResults`] envelope as JSON. The parent collects every envelope from
//! kubectl's combined output with [`parse_structured_output`].
//!
//! The kubectl side of the protocol lives in [`OrderedClient::diff`] and
//! [`OrderedClient::diff_structured`].

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use kube::api::DynamicObject;
use regex::Regex;
use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};
use tracing::debug;

use crate::client::{OrderedClient, WorkDir};
use crate::error::{KubeError, Result};
use crate::format::text_table;
use crate::runner::Invocation;

/// Environment variable kubectl reads to find the external differ
pub const EXTERNAL_DIFF_ENV: &str = "KUBECTL_EXTERNAL_DIFF";
pub const CONTEXT_LINES_ENV: &str = "KADIFF_CONTEXT_LINES";
pub const MAX_LINE_LENGTH_ENV: &str = "KADIFF_MAX_LINE_LENGTH";
pub const MAX_SIZE_ENV: &str = "KADIFF_MAX_SIZE";

const RAW_DIFF_SCRIPT: &str = include_str!("scripts/raw-diff.sh");
const RAW_DIFF_SCRIPT_NAME: &str = "raw-diff.sh";

/// Limits applied to each per-resource diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiffConfig {
    /// Unchanged lines shown around each change
    pub context_lines: usize,
    /// Lines longer than this are cut and end in `...`
    pub max_line_length: usize,
    /// Total characters kept after line clipping
    pub max_size: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            context_lines: 3,
            max_line_length: 256,
            max_size: 3000,
        }
    }
}

impl DiffConfig {
    /// Environment handed to kubectl so the differ sees the same limits
    pub fn env_pairs(&self) -> Vec<(String, String)> {
        vec![
            (CONTEXT_LINES_ENV.to_string(), self.context_lines.to_string()),
            (
                MAX_LINE_LENGTH_ENV.to_string(),
                self.max_line_length.to_string(),
            ),
            (MAX_SIZE_ENV.to_string(), self.max_size.to_string()),
        ]
    }
}

/// Kind of change a diff represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Delete,
    Update,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Delete => write!(f, "delete"),
            Operation::Update => write!(f, "update"),
        }
    }
}

/// Diff of a single resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    /// Typed object from the new side (old side for deletes), if it parsed
    pub object: Option<DynamicObject>,
    pub name: String,
    pub raw_diff: String,
    pub num_added: usize,
    pub num_removed: usize,
    pub operation: Operation,
}

impl DiffResult {
    /// Rough size of the change: the larger of added and removed line counts
    pub fn num_changed_lines(&self) -> usize {
        self.num_added.max(self.num_removed)
    }

    /// Raw diff cut to `max_len` characters
    pub fn clipped_raw_diff(&self, max_len: usize) -> String {
        clip_diff(&self.raw_diff, max_len)
    }

    /// Kind of the attached object, when known
    fn object_kind(&self) -> &str {
        self.object
            .as_ref()
            .and_then(|o| o.types.as_ref())
            .map(|t| t.kind.as_str())
            .unwrap_or("")
    }

    fn object_namespace(&self) -> &str {
        self.object
            .as_ref()
            .and_then(|o| o.metadata.namespace.as_deref())
            .unwrap_or("")
    }
}

/// JSON envelope printed once per differ invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffResults {
    pub results: Vec<DiffResult>,
}

/// Computes per-resource diffs between two trees of manifests
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    pub config: DiffConfig,
}

impl DiffEngine {
    pub fn new(config: DiffConfig) -> Self {
        Self { config }
    }

    /// Set the number of context lines
    pub fn with_context(mut self, lines: usize) -> Self {
        self.config.context_lines = lines;
        self
    }

    /// Compare two paths as kubectl passes them to the external differ
    ///
    /// When either side is a directory, files are paired by name across both
    /// directories; a file (or directory) missing on one side reads as empty.
    /// Otherwise the two paths are compared as a single pair named after the
    /// new file.
    pub fn diff_paths(&self, old: &Path, new: &Path) -> Result<Vec<DiffResult>> {
        let mut results = Vec::new();

        if old.is_dir() || new.is_dir() {
            let mut names = BTreeSet::new();
            names.extend(list_files(old)?);
            names.extend(list_files(new)?);

            for name in names {
                let old_text = read_or_empty(&old.join(&name))?;
                let new_text = read_or_empty(&new.join(&name))?;
                if let Some(result) = self.diff_texts(&name, &old_text, &new_text) {
                    results.push(result);
                }
            }
        } else {
            let name = new
                .file_name()
                .or_else(|| old.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let old_text = read_or_empty(old)?;
            let new_text = read_or_empty(new)?;
            results.extend(self.diff_texts(&name, &old_text, &new_text));
        }

        Ok(results)
    }

    /// Diff one resource; `None` when there is nothing to report
    pub fn diff_texts(&self, name: &str, old: &str, new: &str) -> Option<DiffResult> {
        let old_blank = old.trim().is_empty();
        let new_blank = new.trim().is_empty();
        if old == new || (old_blank && new_blank) {
            return None;
        }

        let operation = if old_blank {
            Operation::Create
        } else if new_blank {
            Operation::Delete
        } else {
            Operation::Update
        };

        let diff = TextDiff::from_lines(old, new);
        let (mut num_added, mut num_removed) = (0, 0);
        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => num_added += 1,
                ChangeTag::Delete => num_removed += 1,
                ChangeTag::Equal => {}
            }
        }

        let unified = diff
            .unified_diff()
            .context_radius(self.config.context_lines)
            .missing_newline_hint(false)
            .to_string();
        let clipped = clip_lines(&unified, self.config.max_line_length);
        let raw_diff = clip_diff(&clipped, self.config.max_size);

        let object_source = match operation {
            Operation::Delete => old,
            _ => new,
        };

        debug!(
            "Diffed {} ({}): +{} -{}",
            name, operation, num_added, num_removed
        );

        Some(DiffResult {
            object: parse_object(object_source),
            name: name.to_string(),
            raw_diff,
            num_added,
            num_removed,
            operation,
        })
    }
}

fn list_files(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

fn read_or_empty(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

fn parse_object(content: &str) -> Option<DynamicObject> {
    let value: serde_json::Value = serde_yaml::from_str(content).ok()?;
    serde_json::from_value(value).ok()
}

/// Cut a single line to `max_len` characters, marking the cut with `...`
pub fn clip_line(line: &str, max_len: usize) -> String {
    match line.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &line[..cut]),
        None => line.to_string(),
    }
}

fn clip_lines(text: &str, max_len: usize) -> String {
    text.split('\n')
        .map(|line| clip_line(line, max_len))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cut a diff to `max_len` characters and note how much was dropped
pub fn clip_diff(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((cut, _)) => {
            let omitted = text[cut..].chars().count();
            format!("{}\n... ({} chars omitted)", &text[..cut], omitted)
        }
        None => text.to_string(),
    }
}

static VOLATILE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\s+)(creationTimestamp|uid)[:]([^\n]+)").expect("static regex is valid")
});

/// Replace values that change on every apply so repeated diffs compare equal
pub fn sanitize_diff(diff: &str) -> String {
    VOLATILE_FIELD
        .replace_all(diff, "${1}${2}: OMITTED")
        .into_owned()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Emission {
    Envelope(DiffResults),
    Single(DiffResult),
}

/// Collect every diff result from kubectl's combined output
///
/// Anything before the first `{` (kubectl warnings, for example) is ignored.
/// The differ runs once per kubectl invocation, so the output may hold
/// several envelopes; bare result objects are accepted too. Results are
/// sorted by name.
pub fn parse_structured_output(output: &[u8]) -> Result<Vec<DiffResult>> {
    let Some(start) = output.iter().position(|b| *b == b'{') else {
        return Ok(Vec::new());
    };

    let mut results = Vec::new();
    let mut rest = &output[start..];

    loop {
        let mut stream = serde_json::Deserializer::from_slice(rest).into_iter::<Emission>();
        match stream.next() {
            Some(Ok(Emission::Envelope(envelope))) => results.extend(envelope.results),
            Some(Ok(Emission::Single(result))) => results.push(result),
            Some(Err(e)) => {
                return Err(KubeError::Serialization(format!(
                    "invalid structured diff output: {}",
                    e
                )));
            }
            None => break,
        }

        let consumed = stream.byte_offset();
        rest = &rest[consumed..];
        match rest.iter().position(|b| *b == b'{') {
            Some(next) => rest = &rest[next..],
            None => break,
        }
    }

    results.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(results)
}

/// One-row-per-resource overview of a diff run
pub fn results_table(results: &[DiffResult]) -> String {
    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|r| {
            vec![
                r.operation.to_string(),
                r.object_namespace().to_string(),
                r.object_kind().to_string(),
                r.name.clone(),
                format!("+{}", r.num_added),
                format!("-{}", r.num_removed),
            ]
        })
        .collect();

    text_table(
        &["Operation", "Namespace", "Kind", "Name", "Added", "Removed"],
        &rows,
    )
}

impl OrderedClient {
    /// Run `kubectl diff` with a plain `diff -u -N` differ and return its text
    pub async fn diff<P: AsRef<Path>>(&self, paths: &[P]) -> Result<String> {
        let workdir = WorkDir::new("kubeapply_diff_", self.config.keep_configs)?;
        let script = workdir.path().join(RAW_DIFF_SCRIPT_NAME);
        write_executable(&script, RAW_DIFF_SCRIPT)?;

        let invocation = self
            .diff_invocation(paths)?
            .env(EXTERNAL_DIFF_ENV, script.display().to_string());

        let output = self.run_diff(&invocation).await?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    /// Run `kubectl diff` through `kadiff` and collect per-resource results
    pub async fn diff_structured<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<DiffResult>> {
        let invocation = self
            .diff_invocation(paths)?
            .env(
                EXTERNAL_DIFF_ENV,
                self.config.kadiff_path.display().to_string(),
            )
            .envs(self.config.diff.env_pairs());

        let output = self.run_diff(&invocation).await?;
        parse_structured_output(&output)
    }

    fn diff_invocation<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Invocation> {
        let mut invocation = Invocation::new(["--kubeconfig"])
            .arg(self.kubeconfig_arg())
            .arg("diff")
            .arg("-R");
        for path in paths {
            invocation = invocation
                .arg("-f")
                .arg(path.as_ref().display().to_string());
        }
        self.finish_invocation(invocation)
    }

    /// kubectl diff exits 1 when differences exist; only other codes are errors
    async fn run_diff(&self, invocation: &Invocation) -> Result<Vec<u8>> {
        let output = self.runner.run(invocation).await?;
        match output.status {
            Some(0) | Some(1) => Ok(output.combined),
            _ => Err(output.into_error(invocation.command_line(&self.runner.program()))),
        }
    }
}

fn write_executable(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}
