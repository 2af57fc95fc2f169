//! Client configuration
//!
//! A `ClientConfig` describes how to reach one cluster through kubectl. It can
//! be built in code or loaded from a YAML file:
//!
//! ```yaml
//! kubeconfig: /etc/kubeapply/prod.kubeconfig
//! serverSideApply: true
//! keepConfigs: false
//! extraEnv:
//!   - AWS_PROFILE=prod
//! discovery: table
//! timeoutSecs: 600
//! diff:
//!   contextLines: 5
//!   maxSize: 4000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::diff::DiffConfig;
use crate::error::{KubeError, Result};

/// Configuration for an [`OrderedClient`](crate::OrderedClient)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Path to the kubeconfig used for every kubectl call
    pub kubeconfig: PathBuf,

    /// kubectl executable
    #[serde(default = "default_kubectl_path")]
    pub kubectl_path: PathBuf,

    /// Structured diff hook executable
    #[serde(default = "default_kadiff_path")]
    pub kadiff_path: PathBuf,

    /// Keep temporary manifest directories for debugging
    #[serde(default)]
    pub keep_configs: bool,

    /// Run kubectl with `-v 8`
    #[serde(default)]
    pub debug: bool,

    /// Use server-side apply and diff
    #[serde(default)]
    pub server_side_apply: bool,

    /// Extra `KEY=VALUE` environment entries for kubectl
    #[serde(default)]
    pub extra_env: Vec<String>,

    /// How kinds are resolved to API resource names for deletes
    #[serde(default)]
    pub discovery: DiscoveryMode,

    /// Per-command timeout; the child process is killed when it expires
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Limits applied by the structured diff hook
    #[serde(default)]
    pub diff: DiffConfig,
}

fn default_kubectl_path() -> PathBuf {
    PathBuf::from("kubectl")
}

fn default_kadiff_path() -> PathBuf {
    PathBuf::from("kadiff")
}

/// Source of kind → resource name mappings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    /// Parse `kubectl api-resources` output
    #[default]
    Table,
    /// Query the API server's discovery endpoints directly
    Live,
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the kubeconfig
    pub fn new(kubeconfig: impl Into<PathBuf>) -> Self {
        Self {
            kubeconfig: kubeconfig.into(),
            kubectl_path: default_kubectl_path(),
            kadiff_path: default_kadiff_path(),
            keep_configs: false,
            debug: false,
            server_side_apply: false,
            extra_env: Vec::new(),
            discovery: DiscoveryMode::default(),
            timeout_secs: None,
            diff: DiffConfig::default(),
        }
    }

    /// Load configuration from a YAML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.kubeconfig.as_os_str().is_empty() {
            return Err(KubeError::InvalidConfig(
                "a kubeconfig path is required".to_string(),
            ));
        }
        self.extra_env_pairs()?;
        Ok(())
    }

    /// Parse `extra_env` into key/value pairs
    pub fn extra_env_pairs(&self) -> Result<Vec<(String, String)>> {
        self.extra_env
            .iter()
            .map(|entry| match entry.split_once('=') {
                Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
                _ => Err(KubeError::InvalidConfig(format!(
                    "extra env entry '{}' is not of the form KEY=VALUE",
                    entry
                ))),
            })
            .collect()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
