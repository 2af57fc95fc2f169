//! API resource discovery
//!
//! Deletes address resources by their plural API name (`deployments`), while
//! resource identifiers carry the kind (`Deployment`). Discovery supplies the
//! mapping, either by parsing `kubectl api-resources` ([`TableDiscovery`]) or
//! by querying the API server directly ([`LiveDiscovery`]). Both cache the
//! first successful answer for the lifetime of the value.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::discovery::{Discovery, Scope};
use kube::{Client, Config};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::{KubeError, Result};
use crate::runner::{CommandRunner, Invocation};

/// One row of `kubectl api-resources`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiResourceInfo {
    /// Plural resource name, e.g. `deployments`
    pub name: String,
    pub short_names: Vec<String>,
    pub api_version: String,
    pub namespaced: bool,
    pub kind: String,
}

/// Source of API resource information
#[async_trait]
pub trait ApiResourceDiscovery: Send + Sync {
    /// All resources served by the cluster
    async fn api_resources(&self) -> Result<Vec<ApiResourceInfo>>;

    /// Kind to plural name; the first resource listed for a kind wins
    async fn plural_names(&self) -> Result<HashMap<String, String>> {
        let mut names = HashMap::new();
        for resource in self.api_resources().await? {
            names.entry(resource.kind).or_insert(resource.name);
        }
        Ok(names)
    }
}

/// Parse the tabular output of `kubectl api-resources`
///
/// Column boundaries come from the header: a column starts wherever a
/// non-space follows a space. Exactly five columns are expected (NAME,
/// SHORTNAMES, APIVERSION, NAMESPACED, KIND) and each row is sliced at the
/// same offsets.
pub fn parse_resources_table(raw: &str) -> Result<Vec<ApiResourceInfo>> {
    let mut rows = raw.trim().lines();
    let header = rows
        .next()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| KubeError::Discovery("no api-resources found".to_string()))?;

    let mut column_starts = Vec::new();
    let mut prev = b' ';
    for (i, curr) in header.bytes().enumerate() {
        if prev == b' ' && curr != b' ' {
            column_starts.push(i);
        }
        prev = curr;
    }

    if column_starts.len() != 5 {
        return Err(KubeError::Discovery(format!(
            "unexpected number of columns; expected 5, got {}",
            column_starts.len()
        )));
    }

    let mut resources = Vec::new();
    for row in rows {
        let row = row.trim_end();
        if row.trim().is_empty() {
            continue;
        }

        let elements = split_row(row, &column_starts);
        if elements.len() < 5 {
            return Err(KubeError::Discovery(format!(
                "unexpected number of columns in row '{}'; expected 5, got {}",
                row,
                elements.len()
            )));
        }

        let short_names = if elements[1].is_empty() {
            Vec::new()
        } else {
            elements[1].split(',').map(str::to_string).collect()
        };

        resources.push(ApiResourceInfo {
            name: elements[0].to_string(),
            short_names,
            api_version: elements[2].to_string(),
            namespaced: elements[3] == "true",
            kind: elements[4].to_string(),
        });
    }

    Ok(resources)
}

fn split_row<'a>(row: &'a str, column_starts: &[usize]) -> Vec<&'a str> {
    let mut elements = Vec::with_capacity(column_starts.len());
    for (i, start) in column_starts.iter().enumerate() {
        let end = column_starts.get(i + 1).copied().unwrap_or(row.len());
        match row.get(*start..end) {
            Some(cell) => elements.push(cell.trim_end()),
            None => break,
        }
    }
    elements
}

/// Discovery through `kubectl api-resources`
pub struct TableDiscovery {
    runner: Arc<dyn CommandRunner>,
    kubeconfig: PathBuf,
    env: Vec<(String, String)>,
    cache: OnceCell<Vec<ApiResourceInfo>>,
}

impl TableDiscovery {
    pub fn new(runner: Arc<dyn CommandRunner>, kubeconfig: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            kubeconfig: kubeconfig.into(),
            env: Vec::new(),
            cache: OnceCell::new(),
        }
    }

    /// Extra environment for the kubectl call
    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }

    async fn fetch(&self) -> Result<Vec<ApiResourceInfo>> {
        let invocation = Invocation::new(["--kubeconfig"])
            .arg(self.kubeconfig.display().to_string())
            .arg("api-resources")
            .envs(self.env.clone());

        let output = self.runner.run(&invocation).await?;
        let raw = output.into_result(invocation.command_line(&self.runner.program()))?;
        let resources = parse_resources_table(&String::from_utf8_lossy(&raw))?;
        debug!("Discovered {} API resources", resources.len());
        Ok(resources)
    }
}

#[async_trait]
impl ApiResourceDiscovery for TableDiscovery {
    async fn api_resources(&self) -> Result<Vec<ApiResourceInfo>> {
        self.cache
            .get_or_try_init(|| self.fetch())
            .await
            .cloned()
    }
}

/// Discovery through the API server's discovery endpoints
pub struct LiveDiscovery {
    kubeconfig: PathBuf,
    cache: OnceCell<Vec<ApiResourceInfo>>,
}

impl LiveDiscovery {
    pub fn new(kubeconfig: impl Into<PathBuf>) -> Self {
        Self {
            kubeconfig: kubeconfig.into(),
            cache: OnceCell::new(),
        }
    }

    async fn fetch(&self) -> Result<Vec<ApiResourceInfo>> {
        let kubeconfig = Kubeconfig::read_from(&self.kubeconfig)?;
        let config =
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
        let client = Client::try_from(config)?;

        let discovery = Discovery::new(client).run().await?;

        let mut resources = Vec::new();
        for group in discovery.groups() {
            for (resource, caps) in group.recommended_resources() {
                resources.push(ApiResourceInfo {
                    name: resource.plural,
                    short_names: Vec::new(),
                    api_version: resource.api_version,
                    namespaced: caps.scope == Scope::Namespaced,
                    kind: resource.kind,
                });
            }
        }

        debug!("Discovered {} API resources from the API server", resources.len());
        Ok(resources)
    }
}

#[async_trait]
impl ApiResourceDiscovery for LiveDiscovery {
    async fn api_resources(&self) -> Result<Vec<ApiResourceInfo>> {
        self.cache
            .get_or_try_init(|| self.fetch())
            .await
            .cloned()
    }
}

/// Fixed resource list, for tests and offline use
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    resources: Vec<ApiResourceInfo>,
}

impl StaticDiscovery {
    pub fn new(resources: Vec<ApiResourceInfo>) -> Self {
        Self { resources }
    }
}

#[async_trait]
impl ApiResourceDiscovery for StaticDiscovery {
    async fn api_resources(&self) -> Result<Vec<ApiResourceInfo>> {
        Ok(self.resources.clone())
    }
}
